// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! File stuff: whole-file reads, directories, globs, MWA .dat file names and
//! metafits input mappings.

mod dat_files;
mod error;
mod glob;
mod metafits;

pub use dat_files::{group_dat_files, parse_dat_file_info, DatFile};
pub use error::{DatFileError, MetafitsError};
pub use glob::{get_all_matches_from_glob, list_files_in_dir, GlobError};
pub use metafits::read_metafits_mapping;

use std::{fs::File, io::Read, path::Path};

use log::trace;

/// Read a whole file into memory.
pub fn read_data_from_file<P: AsRef<Path>>(file: P) -> std::io::Result<Vec<u8>> {
    let file = file.as_ref();
    let mut f = File::open(file)?;
    let mut data = match f.metadata() {
        Ok(m) => Vec::with_capacity(m.len() as usize),
        Err(_) => vec![],
    };
    f.read_to_end(&mut data)?;
    trace!("Read {} bytes from '{}'", data.len(), file.display());
    Ok(data)
}

/// Create a directory and any missing parents. An existing directory is fine.
pub fn create_directory<P: AsRef<Path>>(dir: P) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

pub fn dir_exists<P: AsRef<Path>>(dir: P) -> bool {
    dir.as_ref().is_dir()
}
