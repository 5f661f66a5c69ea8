// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reshaping raw voltages.

use std::path::PathBuf;

use thiserror::Error;

use crate::{buffer::BufferError, obs_info::ObsInfoError};

#[derive(Error, Debug)]
pub enum VoltageError {
    #[error(transparent)]
    ObsInfo(#[from] ObsInfoError),

    #[error("The number of integration steps must be positive")]
    ZeroIntegrationSteps,

    #[error("The number of timesteps per read must be positive")]
    ZeroTimestepsPerRead,

    #[error("Packed voltages always hold 2 polarisations per antenna, but the observation has {0}")]
    UnsupportedPolarisations(u32),

    #[error("Cannot zero {edge} edge channels on each side of a band of {n_frequencies} channels")]
    EdgeTooWide { edge: u32, n_frequencies: u32 },

    #[error("Unexpected voltage buffer size ({got} bytes); expected {expected} bytes")]
    SizeMismatch { got: usize, expected: usize },

    #[error("A voltage buffer of {got} samples was supplied, but the observation requires {expected}")]
    BufferLength { got: usize, expected: usize },

    #[error("Error when reading '{file}': {err}")]
    Read { file: PathBuf, err: std::io::Error },

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[cfg(any(feature = "cuda", feature = "hip"))]
    #[error(transparent)]
    Gpu(#[from] crate::gpu::GpuError),
}
