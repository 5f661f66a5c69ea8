// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Which device runs data-parallel work.

use log::debug;

/// The device used for data-parallel decoding. The CPU is always available;
/// a GPU only when astroio is compiled with the "cuda" or "hip" feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeDevice {
    /// rayon threads on the host.
    Cpu,

    /// A CUDA- or HIP-capable device.
    #[cfg(any(feature = "cuda", feature = "hip"))]
    Gpu,
}

impl DecodeDevice {
    /// The best device available to this process: a GPU if one is compiled in
    /// and present, otherwise the CPU.
    pub fn pick() -> DecodeDevice {
        #[cfg(any(feature = "cuda", feature = "hip"))]
        if num_available_gpus() > 0 {
            return DecodeDevice::Gpu;
        }
        DecodeDevice::Cpu
    }

    /// Get a formatted string with information on the device.
    pub fn get_device_info(self) -> Result<String, DeviceError> {
        match self {
            DecodeDevice::Cpu => Ok(get_cpu_info()),

            #[cfg(any(feature = "cuda", feature = "hip"))]
            DecodeDevice::Gpu => {
                let (device_info, driver_info) = crate::gpu::get_device_info()?;
                #[cfg(feature = "cuda")]
                let device_type = "CUDA";
                #[cfg(feature = "hip")]
                let device_type = "HIP";
                Ok(format!(
                    "{} (capability {}, {} MiB), {device_type} driver {}, runtime {}",
                    device_info.name,
                    device_info.capability,
                    device_info.total_global_mem,
                    driver_info.driver_version,
                    driver_info.runtime_version
                ))
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[cfg(any(feature = "cuda", feature = "hip"))]
    #[error(transparent)]
    Gpu(#[from] crate::gpu::GpuError),
}

/// Was astroio compiled with GPU support?
pub fn gpu_support() -> bool {
    cfg!(any(feature = "cuda", feature = "hip"))
}

/// The number of GPUs usable by this process. Always 0 without GPU support;
/// a GPU runtime error is logged and also counts as 0.
pub fn num_available_gpus() -> usize {
    cfg_if::cfg_if! {
        if #[cfg(any(feature = "cuda", feature = "hip"))] {
            match crate::gpu::get_device_count() {
                Ok(n) => n,
                Err(e) => {
                    debug!("Couldn't count GPUs: {e}");
                    0
                }
            }
        } else {
            debug!("astroio was compiled without GPU support");
            0
        }
    }
}

/// Get a formatted string with information on the CPU.
pub fn get_cpu_info() -> String {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        // Non-exhaustive but perhaps most-interesting CPU features.
        let avx = std::arch::is_x86_feature_detected!("avx");
        let avx2 = std::arch::is_x86_feature_detected!("avx2");
        let avx512 = std::arch::is_x86_feature_detected!("avx512f");

        let features = match (avx512, avx2, avx) {
            (true, _, _) => "AVX512 available",
            (false, true, _) => "AVX2 available",
            (false, false, true) => "AVX available",
            (false, false, false) => "AVX unavailable!",
        };
        format!(
            "{} CPU ({features}), {} threads",
            std::env::consts::ARCH,
            rayon::current_num_threads()
        )
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    format!(
        "{} CPU, {} threads",
        std::env::consts::ARCH,
        rayon::current_num_threads()
    )
}
