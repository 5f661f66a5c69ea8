// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Utilities for CUDA/HIP devices.
//!
//! We assume that everything is UTF-8.

use std::ffi::CStr;

use super::{
    bindings::{get_gpu_device_count, get_gpu_device_info},
    gpu_kernel_call, GpuError,
};

#[derive(Debug, Clone)]
pub struct GpuDriverInfo {
    /// Formatted CUDA/HIP driver version, e.g. "11.7".
    pub driver_version: Box<str>,
    /// Formatted CUDA/HIP runtime version, e.g. "11.7".
    pub runtime_version: Box<str>,
}

#[derive(Debug, Clone)]
pub struct GpuDeviceInfo {
    pub name: Box<str>,
    pub capability: Box<str>,
    /// \[MebiBytes (MiB)\]
    pub total_global_mem: usize,
}

/// The number of GPUs the runtime can see. A runtime error (e.g. no driver)
/// is reported as an error rather than zero devices.
pub fn get_device_count() -> Result<usize, GpuError> {
    let mut count = 0;
    gpu_kernel_call!(get_gpu_device_count, &mut count)?;
    Ok(count.max(0) as usize)
}

/// Get CUDA/HIP device and driver information. At present, this function only
/// returns information on "device 0".
pub fn get_device_info() -> Result<(GpuDeviceInfo, GpuDriverInfo), GpuError> {
    let device = 0;
    let mut name = [0 as std::os::raw::c_char; 256];
    let mut device_major = 0;
    let mut device_minor = 0;
    let mut total_global_mem = 0;
    let mut driver_version = 0;
    let mut runtime_version = 0;
    gpu_kernel_call!(
        get_gpu_device_info,
        device,
        name.as_mut_ptr(),
        &mut device_major,
        &mut device_minor,
        &mut total_global_mem,
        &mut driver_version,
        &mut runtime_version,
    )?;
    // Make sure the name is terminated.
    name[255] = 0;
    let name = unsafe { CStr::from_ptr(name.as_ptr()) }
        .to_string_lossy()
        .into_owned()
        .into_boxed_str();

    let device_info = GpuDeviceInfo {
        name,
        capability: format!("{device_major}.{device_minor}").into_boxed_str(),
        total_global_mem: total_global_mem / 1048576,
    };

    #[cfg(feature = "cuda")]
    let (driver_version, runtime_version) = {
        let d = format!("{}.{}", driver_version / 1000, (driver_version / 10) % 100);
        let r = format!(
            "{}.{}",
            runtime_version / 1000,
            (runtime_version / 10) % 100
        );
        (d, r)
    };
    #[cfg(feature = "hip")]
    let (driver_version, runtime_version) = {
        let d = format!(
            "{}.{}",
            driver_version / 10_000_000,
            (driver_version / 10_000) % 100
        );
        let r = format!(
            "{}.{}",
            runtime_version / 10_000_000,
            (runtime_version / 10_000) % 100
        );
        (d, r)
    };

    Ok((
        device_info,
        GpuDriverInfo {
            driver_version: driver_version.into_boxed_str(),
            runtime_version: runtime_version.into_boxed_str(),
        },
    ))
}
