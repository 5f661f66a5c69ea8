// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! MWA Phase I VCS .dat files. Each holds one coarse channel of one second
//! of an observation and is named `<obsid>_<gpstime>_ch<NN>.dat`.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use super::DatFileError;
use crate::{
    constants::NUM_COARSE_CHANNELS,
    obs_info::{gps_to_unix, ObservationInfo},
};

lazy_static! {
    static ref DAT_FILE_REGEX: Regex =
        Regex::new(r"^(?P<obsid>\d+)_(?P<gps>\d+)_ch(?P<chan>\d+)\.dat$").unwrap();
}

/// A .dat file and what its name says about it.
#[derive(Debug, Clone, PartialEq)]
pub struct DatFile {
    pub path: PathBuf,
    pub obs_info: ObservationInfo,
}

/// Get the observation ID, start time and coarse channel out of a .dat file's
/// name. Everything else comes from the VCS preset.
pub fn parse_dat_file_info<P: AsRef<Path>>(file: P) -> Result<ObservationInfo, DatFileError> {
    let file = file.as_ref();
    let bad_name = || DatFileError::BadName {
        file: file.to_path_buf(),
    };
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(bad_name)?;
    let caps = DAT_FILE_REGEX.captures(name).ok_or_else(bad_name)?;
    let gps: i64 = caps["gps"].parse().map_err(|_| bad_name())?;
    let coarse_channel: u32 = caps["chan"].parse().map_err(|_| bad_name())?;

    let mut obs_info = ObservationInfo::vcs();
    obs_info.id = caps["obsid"].to_string();
    obs_info.start_time = gps_to_unix(gps);
    obs_info.coarse_channel = coarse_channel;
    Ok(obs_info)
}

/// Sort .dat files and split them into seconds of observation, each of which
/// must have every coarse channel. Only a single observation is handled.
pub fn group_dat_files<P: AsRef<Path>>(files: &[P]) -> Result<Vec<Vec<DatFile>>, DatFileError> {
    if files.is_empty() {
        return Err(DatFileError::NoFiles);
    }
    if files.len() % NUM_COARSE_CHANNELS != 0 {
        return Err(DatFileError::NotMultipleOfCoarseChannels { count: files.len() });
    }

    let mut dat_files = files
        .iter()
        .map(|f| {
            let path = f.as_ref().to_path_buf();
            parse_dat_file_info(&path).map(|obs_info| DatFile { path, obs_info })
        })
        .collect::<Result<Vec<_>, _>>()?;
    dat_files.sort_by(|a, b| {
        (&a.obs_info.id, a.obs_info.start_time, a.obs_info.coarse_channel).cmp(&(
            &b.obs_info.id,
            b.obs_info.start_time,
            b.obs_info.coarse_channel,
        ))
    });

    let first_id = &dat_files[0].obs_info.id;
    if let Some(other) = dat_files.iter().find(|d| &d.obs_info.id != first_id) {
        return Err(DatFileError::MultipleObservations {
            first: first_id.clone(),
            second: other.obs_info.id.clone(),
        });
    }

    let mut seconds = vec![];
    for (start_time, group) in &dat_files.into_iter().group_by(|d| d.obs_info.start_time) {
        let group: Vec<DatFile> = group.collect();
        if group.len() != NUM_COARSE_CHANNELS {
            return Err(DatFileError::IncompleteSecond {
                start_time,
                got: group.len(),
            });
        }
        seconds.push(group);
    }
    debug!("Grouped .dat files into {} seconds", seconds.len());
    Ok(seconds)
}
