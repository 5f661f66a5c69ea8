// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Report what data-parallel work can run on.

use log::info;

use crate::{
    device::{gpu_support, num_available_gpus, DecodeDevice},
    AstroIoError,
};

pub(super) fn gpu_info() -> Result<(), AstroIoError> {
    let support = if gpu_support() {
        if cfg!(feature = "cuda") {
            "CUDA"
        } else {
            "HIP"
        }
    } else {
        "none"
    };
    info!("GPU support: {support}");
    info!("Available GPUs: {}", num_available_gpus());

    let device = DecodeDevice::pick();
    info!(
        "Parallel decoding uses: {}",
        device.get_device_info()?
    );
    Ok(())
}
