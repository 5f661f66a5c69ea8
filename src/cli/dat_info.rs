// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Check that a set of MWA VCS .dat files makes up whole seconds of an
//! observation, and describe them.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info};

use crate::{
    io::{get_all_matches_from_glob, group_dat_files, list_files_in_dir},
    AstroIoError,
};

#[derive(Parser, Debug)]
pub(super) struct DatInfoArgs {
    /// Paths or glob patterns (e.g. "1313388760_*.dat") of the .dat files.
    #[clap(name = "DAT_FILES")]
    pub(super) files: Vec<String>,

    /// Also use every .dat file in this directory.
    #[clap(short, long, parse(from_os_str))]
    pub(super) dir: Option<PathBuf>,
}

impl DatInfoArgs {
    pub(super) fn run(self) -> Result<(), AstroIoError> {
        let mut files = vec![];
        for f in &self.files {
            let matches = get_all_matches_from_glob(f)?;
            if matches.is_empty() {
                // Let the grouping complain about it.
                files.push(PathBuf::from(f));
            } else {
                files.extend(matches);
            }
        }
        if let Some(dir) = &self.dir {
            files.extend(list_files_in_dir(dir, "dat")?);
        }
        debug!("Got {} .dat files", files.len());

        let seconds = group_dat_files(&files)?;
        let first = &seconds[0][0].obs_info;
        info!("Observation {}", first.id);
        info!(
            "{} seconds of {} coarse channels",
            seconds.len(),
            seconds[0].len()
        );
        for second in &seconds {
            let obs = &second[0].obs_info;
            let channels = second
                .iter()
                .map(|d| d.obs_info.coarse_channel.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            info!("{} ({}): channels {channels}", obs.start_time, obs.start_epoch());
        }
        Ok(())
    }
}
