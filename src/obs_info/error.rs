// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with observation metadata.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObsInfoError {
    #[error("The number of {0} in the observation must be positive")]
    ZeroCount(&'static str),

    #[error("The time resolution must be positive; got {0}")]
    BadTimeResolution(f64),

    #[error("Cannot average {n_frequencies} channels by a factor of {averaged_channels}")]
    AveragedChannels {
        averaged_channels: u32,
        n_frequencies: u32,
    },
}
