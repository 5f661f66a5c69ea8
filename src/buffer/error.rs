// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with heterogeneous memory buffers.

use std::path::PathBuf;

use thiserror::Error;

use super::MemoryKind;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("Device memory cannot be pinned; request either pinned host memory or device memory")]
    PinnedAndDevice,

    #[error("Cannot use {0} memory; astroio was compiled without GPU support (enable the 'cuda' or 'hip' feature)")]
    NoGpuSupport(MemoryKind),

    #[error("A memory buffer must hold a positive number of elements")]
    ZeroLength,

    #[error("Refusing to adopt a null pointer")]
    NullPointer,

    #[error("The buffer's memory is {0}, but host-resident memory is required; call to_host() first")]
    NotOnHost(MemoryKind),

    #[error("The dump file '{file}' has {size} bytes, which is not a positive multiple of the element size ({element_size} bytes)")]
    BadDumpSize {
        file: PathBuf,
        size: usize,
        element_size: usize,
    },

    #[cfg(any(feature = "cuda", feature = "hip"))]
    #[error(transparent)]
    Gpu(#[from] crate::gpu::GpuError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
