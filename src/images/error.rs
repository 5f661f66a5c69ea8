// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with image cubes.

use std::path::PathBuf;

use thiserror::Error;

use crate::{buffer::BufferError, fits::FitsError, obs_info::ObsInfoError};

#[derive(Error, Debug)]
pub enum ImagesError {
    #[error(transparent)]
    ObsInfo(#[from] ObsInfoError),

    #[error("The number of integration steps must be positive")]
    ZeroIntegrationSteps,

    #[error("The side length of an image must be positive")]
    ZeroSide,

    #[error("An image buffer of {got} pixels was supplied, but {expected} are required")]
    BufferLength { got: usize, expected: usize },

    #[error("Got {got} flags, but there are {expected} images")]
    FlagsLength { got: usize, expected: usize },

    #[error("Couldn't create directory '{dir}': {err}")]
    CreateDir { dir: PathBuf, err: std::io::Error },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Fits(#[from] FitsError),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}
