// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Functions to glob files.

use std::path::{Path, PathBuf};

use glob::glob;
use thiserror::Error;

/// Given a glob pattern, get all of the matches from the filesystem.
pub fn get_all_matches_from_glob(g: &str) -> Result<Vec<PathBuf>, GlobError> {
    let mut entries = vec![];
    for entry in glob(g)? {
        match entry {
            Ok(e) => entries.push(e),
            Err(e) => return Err(GlobError::GlobCrate(e)),
        }
    }
    Ok(entries)
}

/// List the files in `dir` with extension `ext` (without the dot), sorted.
/// An empty `ext` lists every file.
pub fn list_files_in_dir<P: AsRef<Path>>(dir: P, ext: &str) -> Result<Vec<PathBuf>, GlobError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(GlobError::NotADirectory {
            dir: dir.to_path_buf(),
        });
    }
    let pattern = if ext.is_empty() {
        "*".to_string()
    } else {
        format!("*.{ext}")
    };
    let escaped = glob::Pattern::escape(&dir.display().to_string());
    let mut files: Vec<PathBuf> = get_all_matches_from_glob(&format!("{escaped}/{pattern}"))?
        .into_iter()
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

#[derive(Error, Debug)]
/// Error type associated with glob helper functions.
pub enum GlobError {
    #[error("'{dir}' isn't a directory")]
    NotADirectory { dir: PathBuf },

    #[error(transparent)]
    GlobCrate(#[from] glob::GlobError),

    #[error(transparent)]
    PatternError(#[from] glob::PatternError),
}
