// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Metadata describing an observation: how the telescope was configured and
//! when the observation started.

mod error;

pub use error::ObsInfoError;

use std::path::PathBuf;

use hifitime::{Duration, Epoch};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::constants::{GPS_EPOCH_AS_UNIX, GPS_LEAP_SECONDS};

/// The instrument that recorded an observation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Telescope {
    #[default]
    #[strum(to_string = "mwa1", serialize = "mwa")]
    Mwa1,

    #[strum(serialize = "mwa2")]
    Mwa2,

    #[strum(serialize = "mwa3")]
    Mwa3,

    #[strum(serialize = "eda2")]
    Eda2,
}

/// Telescope configuration, start time and identity of an observation.
///
/// Data products hold their own copy of this struct; it is never shared
/// mutably between products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationInfo {
    pub n_antennas: u32,
    pub n_frequencies: u32,
    pub n_polarisations: u32,
    pub n_timesteps: u32,

    /// Time resolution \[seconds\]
    pub time_resolution: f64,

    /// When the observation starts \[Unix seconds\]
    pub start_time: i64,

    /// Receiver coarse channel number.
    pub coarse_channel: u32,

    /// Index of the coarse channel within the coarse channels that make up a
    /// full MWA observation.
    #[serde(default)]
    pub coarse_channel_index: u32,

    /// The observation ID (for the MWA, its GPS start time).
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub telescope: Telescope,

    #[serde(default)]
    pub metadata_file: Option<PathBuf>,

    #[serde(default)]
    pub calibration_solutions_file: Option<PathBuf>,
}

impl ObservationInfo {
    /// The configuration of a single MWA VCS (legacy, phase I) coarse-channel
    /// .dat file: one second of data for one coarse channel.
    pub fn vcs() -> ObservationInfo {
        ObservationInfo {
            n_antennas: 128,
            n_frequencies: 128,
            n_polarisations: 2,
            n_timesteps: 10000,
            time_resolution: 0.0001,
            start_time: 1313388762,
            coarse_channel: 20,
            coarse_channel_index: 0,
            id: String::new(),
            telescope: Telescope::Mwa1,
            metadata_file: None,
            calibration_solutions_file: None,
        }
    }

    /// The configuration of an EDA2 station voltage dump.
    pub fn eda2() -> ObservationInfo {
        ObservationInfo {
            n_antennas: 256,
            n_frequencies: 1,
            n_polarisations: 2,
            n_timesteps: 262144,
            time_resolution: 1.08e-6,
            start_time: 0,
            coarse_channel: 0,
            coarse_channel_index: 0,
            id: String::new(),
            telescope: Telescope::Eda2,
            metadata_file: None,
            calibration_solutions_file: None,
        }
    }

    /// The preset for a telescope.
    pub fn for_telescope(telescope: Telescope) -> ObservationInfo {
        match telescope {
            Telescope::Eda2 => Self::eda2(),
            t => ObservationInfo {
                telescope: t,
                ..Self::vcs()
            },
        }
    }

    /// Check that all of the counts are positive.
    pub fn validate(&self) -> Result<(), ObsInfoError> {
        for (what, count) in [
            ("antennas", self.n_antennas),
            ("frequencies", self.n_frequencies),
            ("polarisations", self.n_polarisations),
            ("timesteps", self.n_timesteps),
        ] {
            if count == 0 {
                return Err(ObsInfoError::ZeroCount(what));
            }
        }
        if !(self.time_resolution > 0.0) {
            return Err(ObsInfoError::BadTimeResolution(self.time_resolution));
        }
        Ok(())
    }

    /// The number of complex samples recorded in one timestep.
    pub fn samples_per_timestep(&self) -> usize {
        self.n_frequencies as usize * self.n_antennas as usize * self.n_polarisations as usize
    }

    /// The number of complex samples in the whole observation.
    pub fn num_samples(&self) -> usize {
        self.samples_per_timestep() * self.n_timesteps as usize
    }

    /// The number of channels left after averaging every `averaged_channels`
    /// channels together. The averaging factor must divide the channel count.
    pub fn averaged_frequencies(&self, averaged_channels: u32) -> Result<u32, ObsInfoError> {
        if averaged_channels == 0 || self.n_frequencies % averaged_channels != 0 {
            return Err(ObsInfoError::AveragedChannels {
                averaged_channels,
                n_frequencies: self.n_frequencies,
            });
        }
        Ok(self.n_frequencies / averaged_channels)
    }

    /// The start of the observation as an [`Epoch`].
    pub fn start_epoch(&self) -> Epoch {
        Epoch::from_unix_seconds(self.start_time as f64)
    }

    /// The duration of the observation.
    pub fn duration(&self) -> Duration {
        Duration::from_seconds(self.time_resolution * self.n_timesteps as f64)
    }
}

/// Convert a GPS time \[seconds\] into a Unix time \[seconds\], assuming the
/// leap-second count in force since the end of 2016.
pub fn gps_to_unix(gps: i64) -> i64 {
    GPS_EPOCH_AS_UNIX + gps - GPS_LEAP_SECONDS
}
