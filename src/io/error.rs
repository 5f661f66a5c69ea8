// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with MWA file names and metafits files.

use std::path::PathBuf;

use thiserror::Error;

use crate::constants::NUM_COARSE_CHANNELS;

#[derive(Error, Debug)]
pub enum DatFileError {
    #[error("'{file}' isn't named like an MWA VCS file (<obsid>_<gpstime>_ch<NN>.dat)")]
    BadName { file: PathBuf },

    #[error("No .dat files were supplied")]
    NoFiles,

    #[error("{count} .dat files were supplied, but this isn't a multiple of {}", NUM_COARSE_CHANNELS)]
    NotMultipleOfCoarseChannels { count: usize },

    #[error("Cannot read multiple observations at once (found {first} and {second})")]
    MultipleObservations { first: String, second: String },

    #[error("The second starting at Unix time {start_time} has {got} .dat files instead of {}", NUM_COARSE_CHANNELS)]
    IncompleteSecond { start_time: i64, got: usize },
}

#[derive(Error, Debug)]
pub enum MetafitsError {
    #[error("Metafits input {input} is outside the {count} inputs listed")]
    BadInput { input: u32, count: usize },

    #[error(transparent)]
    Mwalib(#[from] mwalib::MwalibError),
}
