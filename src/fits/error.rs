// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading and writing FITS containers.

use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitsError {
    /// Error when opening or creating a fits file.
    #[error(
        "{source_file}:{source_line}:{source_column}: Couldn't open {fits_filename}: {fits_error}"
    )]
    Open {
        fits_error: Box<fitsio::errors::Error>,
        fits_filename: Box<Path>,
        source_file: &'static str,
        source_line: u32,
        source_column: u32,
    },

    /// A generic error associated with a cfitsio call.
    #[error("{source_file}:{source_line}:{source_column}: {fits_filename} HDU {hdu_num}: {fits_error}")]
    Fitsio {
        fits_error: Box<fitsio::errors::Error>,
        fits_filename: Box<Path>,
        hdu_num: usize,
        source_file: &'static str,
        source_line: u32,
        source_column: u32,
    },

    /// Only images with 0 or 2 axes can be held.
    #[error("{fits_filename} HDU {hdu_num}: Expected 0 or 2 image axes, but found {naxis}")]
    UnsupportedDimensions {
        fits_filename: Box<Path>,
        hdu_num: usize,
        naxis: i32,
    },

    #[error("{fits_filename} HDU {hdu_num}: BITPIX {bitpix} isn't supported")]
    UnsupportedBitpix {
        fits_filename: Box<Path>,
        hdu_num: usize,
        bitpix: i32,
    },

    #[error("Couldn't find key {key}")]
    MissingKey { key: Box<str> },

    #[error("Key {key} holds {value}, which can't be read as {expected}")]
    KeyType {
        key: Box<str>,
        value: String,
        expected: &'static str,
    },

    #[error("An image of {x} x {y} pixels needs {} values, but {got} were supplied", .x * .y)]
    ImageSize { got: usize, x: usize, y: usize },

    #[error("Keyword '{0}' contains a NUL byte")]
    NulByte(String),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
