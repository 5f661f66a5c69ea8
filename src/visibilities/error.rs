// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with visibilities.

use std::path::PathBuf;

use thiserror::Error;

use crate::{buffer::BufferError, fits::FitsError, obs_info::ObsInfoError};

#[derive(Error, Debug)]
pub enum VisibilitiesError {
    #[error(transparent)]
    ObsInfo(#[from] ObsInfoError),

    #[error("The number of integration steps must be positive")]
    ZeroIntegrationSteps,

    #[error("A visibility buffer of {got} samples was supplied, but {expected} are required")]
    BufferLength { got: usize, expected: usize },

    #[error("'{file}' has no HDUs")]
    NoHdus { file: PathBuf },

    #[error("'{file}' has {n_hdus} HDUs, but its integration time makes {expected} intervals of {integration_steps} timesteps from the observation's {n_timesteps}")]
    Intervals {
        file: PathBuf,
        n_hdus: usize,
        n_timesteps: u32,
        integration_steps: u32,
        expected: usize,
    },

    #[error("'{file}' HDU {hdu}: Expected a single precision image")]
    NotFloat { file: PathBuf, hdu: usize },

    #[error("'{file}' HDU {hdu}: The matrix axis has {got} values instead of {expected}")]
    MatrixAxis {
        file: PathBuf,
        hdu: usize,
        got: usize,
        expected: usize,
    },

    #[error("'{file}' HDU {hdu}: The frequency axis has {got} channels instead of {expected}")]
    FrequencyAxis {
        file: PathBuf,
        hdu: usize,
        got: usize,
        expected: usize,
    },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Fits(#[from] FitsError),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}
