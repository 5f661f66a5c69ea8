// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod adjust_fits;
mod reshape;
mod utilities;

use std::{path::Path, process::Output, str::from_utf8};

use assert_cmd::{output::OutputError, Command};

fn astroio() -> Command {
    Command::cargo_bin("astroio").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// The bytes per timestep of an MWA VCS .dat file: 128 channels of 128
/// antennas, one byte per polarisation.
const VCS_BYTES_PER_TIMESTEP: usize = 128 * 128 * 2;

/// Write `n_timesteps` of a VCS capture into `dir`, every byte set to `byte`,
/// with a conventional .dat name.
fn write_dat_file(dir: &Path, n_timesteps: usize, byte: u8) -> String {
    let file = dir.join("1313388760_1313388762_ch144.dat");
    std::fs::write(&file, vec![byte; n_timesteps * VCS_BYTES_PER_TIMESTEP]).unwrap();
    file.display().to_string()
}
