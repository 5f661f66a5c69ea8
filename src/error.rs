// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The error type for all astroio errors. Every module's error converts into
//! [`AstroIoError`], which sorts it into one of a handful of categories.

use strum_macros::{Display, EnumIter};
use thiserror::Error;

use crate::{
    buffer::BufferError,
    device::DeviceError,
    fits::FitsError,
    images::ImagesError,
    io::{DatFileError, GlobError, MetafitsError},
    obs_info::ObsInfoError,
    unit_parsing::UnitParseError,
    visibilities::VisibilitiesError,
    voltages::VoltageError,
};

/// The broad kind of an [`AstroIoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ErrorCategory {
    /// Invalid parameters or a build that can't do what was asked.
    Configuration,

    /// Input whose length disagrees with its description.
    #[strum(serialize = "Size mismatch")]
    SizeMismatch,

    /// Data that isn't shaped as expected.
    Format,

    #[strum(serialize = "IO")]
    Io,

    /// A GPU allocation, transfer or kernel failure.
    Device,
}

#[derive(Error, Debug)]
pub enum AstroIoError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    SizeMismatch(String),

    #[error("{0}")]
    Format(String),

    #[error("{0}")]
    Io(String),

    /// GPU errors are rarely transient, so some help is provided.
    #[error("{0}\n\nThis is a GPU error; `astroio gpu-info` shows whether a GPU can be used")]
    Device(String),
}

impl AstroIoError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AstroIoError::Configuration(_) => ErrorCategory::Configuration,
            AstroIoError::SizeMismatch(_) => ErrorCategory::SizeMismatch,
            AstroIoError::Format(_) => ErrorCategory::Format,
            AstroIoError::Io(_) => ErrorCategory::Io,
            AstroIoError::Device(_) => ErrorCategory::Device,
        }
    }
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<ObsInfoError> for AstroIoError {
    fn from(e: ObsInfoError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<BufferError> for AstroIoError {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::PinnedAndDevice
            | BufferError::NoGpuSupport(_)
            | BufferError::ZeroLength
            | BufferError::NullPointer
            | BufferError::NotOnHost(_) => Self::Configuration(e.to_string()),
            BufferError::BadDumpSize { .. } => Self::SizeMismatch(e.to_string()),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            BufferError::Gpu(_) => Self::Device(e.to_string()),
            BufferError::IO(_) => Self::Io(e.to_string()),
        }
    }
}

impl From<VoltageError> for AstroIoError {
    fn from(e: VoltageError) -> Self {
        match e {
            VoltageError::ObsInfo(e) => Self::from(e),
            VoltageError::Buffer(e) => Self::from(e),
            VoltageError::ZeroIntegrationSteps
            | VoltageError::ZeroTimestepsPerRead
            | VoltageError::UnsupportedPolarisations(_)
            | VoltageError::EdgeTooWide { .. } => Self::Configuration(e.to_string()),
            VoltageError::SizeMismatch { .. } | VoltageError::BufferLength { .. } => {
                Self::SizeMismatch(e.to_string())
            }
            VoltageError::Read { .. } => Self::Io(e.to_string()),
            #[cfg(any(feature = "cuda", feature = "hip"))]
            VoltageError::Gpu(_) => Self::Device(e.to_string()),
        }
    }
}

impl From<VisibilitiesError> for AstroIoError {
    fn from(e: VisibilitiesError) -> Self {
        match e {
            VisibilitiesError::ObsInfo(e) => Self::from(e),
            VisibilitiesError::Fits(e) => Self::from(e),
            VisibilitiesError::Buffer(e) => Self::from(e),
            VisibilitiesError::ZeroIntegrationSteps => Self::Configuration(e.to_string()),
            VisibilitiesError::BufferLength { .. } => Self::SizeMismatch(e.to_string()),
            VisibilitiesError::NoHdus { .. }
            | VisibilitiesError::Intervals { .. }
            | VisibilitiesError::NotFloat { .. }
            | VisibilitiesError::MatrixAxis { .. }
            | VisibilitiesError::FrequencyAxis { .. }
            | VisibilitiesError::Shape(_) => Self::Format(e.to_string()),
        }
    }
}

impl From<ImagesError> for AstroIoError {
    fn from(e: ImagesError) -> Self {
        match e {
            ImagesError::ObsInfo(e) => Self::from(e),
            ImagesError::Fits(e) => Self::from(e),
            ImagesError::Buffer(e) => Self::from(e),
            ImagesError::ZeroIntegrationSteps | ImagesError::ZeroSide => {
                Self::Configuration(e.to_string())
            }
            ImagesError::BufferLength { .. } => Self::SizeMismatch(e.to_string()),
            ImagesError::FlagsLength { .. } | ImagesError::Shape(_) => Self::Format(e.to_string()),
            ImagesError::CreateDir { .. } => Self::Io(e.to_string()),
        }
    }
}

impl From<FitsError> for AstroIoError {
    fn from(e: FitsError) -> Self {
        match e {
            FitsError::Open { .. } | FitsError::Fitsio { .. } | FitsError::IO(_) => {
                Self::Io(e.to_string())
            }
            FitsError::UnsupportedDimensions { .. }
            | FitsError::UnsupportedBitpix { .. }
            | FitsError::MissingKey { .. }
            | FitsError::KeyType { .. }
            | FitsError::NulByte(_) => Self::Format(e.to_string()),
            FitsError::ImageSize { .. } => Self::SizeMismatch(e.to_string()),
        }
    }
}

impl From<DatFileError> for AstroIoError {
    fn from(e: DatFileError) -> Self {
        Self::Format(e.to_string())
    }
}

impl From<MetafitsError> for AstroIoError {
    fn from(e: MetafitsError) -> Self {
        match e {
            MetafitsError::BadInput { .. } => Self::Format(e.to_string()),
            MetafitsError::Mwalib(_) => Self::Io(e.to_string()),
        }
    }
}

impl From<GlobError> for AstroIoError {
    fn from(e: GlobError) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<UnitParseError> for AstroIoError {
    fn from(e: UnitParseError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<DeviceError> for AstroIoError {
    fn from(e: DeviceError) -> Self {
        Self::Device(e.to_string())
    }
}

#[cfg(any(feature = "cuda", feature = "hip"))]
impl From<crate::gpu::GpuError> for AstroIoError {
    fn from(e: crate::gpu::GpuError) -> Self {
        Self::Device(e.to_string())
    }
}

impl From<std::io::Error> for AstroIoError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
