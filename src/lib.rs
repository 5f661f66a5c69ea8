// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Ingestion of raw voltages recorded by the Murchison Widefield Array (MWA) and
the Engineering Development Array (EDA2), and the data layouts of the
voltages, visibilities and images made from them.
 */

pub mod buffer;
pub mod cli;
pub mod constants;
pub mod decode;
pub mod device;
mod error;
pub mod fits;
#[cfg(any(feature = "cuda", feature = "hip"))]
pub mod gpu;
pub mod images;
pub mod io;
pub mod obs_info;
pub mod unit_parsing;
pub mod visibilities;
pub mod voltages;

// Re-exports.
pub use buffer::{BufferError, MemoryBuffer, MemoryKind};
pub use cli::Astroio;
pub use error::{AstroIoError, ErrorCategory};
pub use fits::{FitsContainer, Hdu, HeaderValue};
pub use images::Images;
pub use obs_info::{ObservationInfo, Telescope};
pub use visibilities::Visibilities;
pub use voltages::{ReshapeOptions, Voltages};
