// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! GPU code to be used by astroio.

#![allow(non_snake_case)]
#![allow(clippy::upper_case_acronyms)]

mod bindings;
#[cfg(test)]
mod tests;
mod utils;

use std::{
    ffi::{c_void, CStr},
    panic::Location,
    ptr::null_mut,
};

use thiserror::Error;

pub(crate) use bindings::decode_voltages;
pub use utils::{get_device_count, get_device_info, GpuDeviceInfo, GpuDriverInfo};

// Import CUDA/HIP functions into the same names.
#[cfg(feature = "cuda")]
use cuda_runtime_sys::{
    cudaDeviceSynchronize as gpuDeviceSynchronize, cudaError::cudaSuccess as gpuSuccess,
    cudaFree as gpuFree, cudaFreeHost as gpuFreeHost, cudaGetErrorString as gpuGetErrorString,
    cudaGetLastError as gpuGetLastError, cudaHostAlloc as gpuHostAlloc, cudaMalloc as gpuMalloc,
    cudaMemcpy as gpuMemcpy, cudaMemcpyKind::cudaMemcpyDeviceToDevice as gpuMemcpyDeviceToDevice,
    cudaMemcpyKind::cudaMemcpyDeviceToHost as gpuMemcpyDeviceToHost,
    cudaMemcpyKind::cudaMemcpyHostToDevice as gpuMemcpyHostToDevice,
};
#[cfg(feature = "hip")]
use hip_sys::hiprt::{
    hipDeviceSynchronize as gpuDeviceSynchronize, hipError_t::hipSuccess as gpuSuccess,
    hipFree as gpuFree, hipGetErrorString as gpuGetErrorString, hipGetLastError as gpuGetLastError,
    hipHostFree as gpuFreeHost, hipHostMalloc as gpuHostAlloc, hipMalloc as gpuMalloc,
    hipMemcpy as gpuMemcpy, hipMemcpyKind::hipMemcpyDeviceToDevice as gpuMemcpyDeviceToDevice,
    hipMemcpyKind::hipMemcpyDeviceToHost as gpuMemcpyDeviceToHost,
    hipMemcpyKind::hipMemcpyHostToDevice as gpuMemcpyHostToDevice,
};

macro_rules! gpu_kernel_call {
    ($gpu_fn:path, $($args:expr),* $(,)?) => {{
        #[allow(unused_unsafe)]
        unsafe {
            let error_message_ptr = $gpu_fn($($args),*);
            if error_message_ptr.is_null() {
                Ok(())
            } else {
                // Get the GPU error message behind the pointer.
                let error_message = std::ffi::CStr::from_ptr(error_message_ptr).to_str();
                #[cfg(feature = "cuda")]
                let error_message = error_message.unwrap_or("<cannot read CUDA error string>");
                #[cfg(feature = "hip")]
                let error_message = error_message.unwrap_or("<cannot read HIP error string>");
                let our_error_message = format!("{}: {error_message}", stringify!($gpu_fn));
                Err($crate::gpu::GpuError::Kernel {
                    msg: our_error_message.into(),
                    file: file!(),
                    line: line!(),
                })
            }
        }
    }};
}
pub(crate) use gpu_kernel_call;

#[derive(Clone, Copy)]
pub(crate) enum GpuCall {
    Malloc,
    HostAlloc,
    CopyToDevice,
    CopyFromDevice,
}

/// Run [`gpuGetLastError`] and [`gpuDeviceSynchronize`]. If either of these
/// calls return an error, it is converted to a Rust error and returned from
/// this function. The single argument describes what the just-performed
/// operation was and makes the returned error a helpful one.
///
/// # Safety
///
/// This function interfaces directly with the CUDA/HIP API. Rust errors attempt
/// to catch problems but there are no guarantees.
#[track_caller]
unsafe fn check_for_errors(gpu_call: GpuCall) -> Result<(), GpuError> {
    // Only do a device sync if we're in debug mode, for performance.
    let debug_mode = matches!(std::env::var("DEBUG").as_deref(), Ok("true"));
    if debug_mode {
        let code = gpuDeviceSynchronize();
        if code != gpuSuccess {
            return Err(to_gpu_error(gpu_call, gpuGetErrorString(code)));
        }
    }

    let code = gpuGetLastError();
    if code != gpuSuccess {
        return Err(to_gpu_error(gpu_call, gpuGetErrorString(code)));
    }

    Ok(())
}

#[track_caller]
unsafe fn to_gpu_error(gpu_call: GpuCall, c_msg: *const std::os::raw::c_char) -> GpuError {
    let msg = CStr::from_ptr(c_msg).to_str();
    #[cfg(feature = "cuda")]
    let msg = msg.unwrap_or("<cannot read CUDA error string>");
    #[cfg(feature = "hip")]
    let msg = msg.unwrap_or("<cannot read HIP error string>");
    let msg = msg.into();
    let location = Location::caller();
    let (file, line) = (location.file(), location.line());
    match gpu_call {
        GpuCall::Malloc => GpuError::Malloc { msg, file, line },
        GpuCall::HostAlloc => GpuError::HostAlloc { msg, file, line },
        GpuCall::CopyToDevice => GpuError::CopyToDevice { msg, file, line },
        GpuCall::CopyFromDevice => GpuError::CopyFromDevice { msg, file, line },
    }
}

/// A Rust-managed pointer to GPU device memory. When this is dropped,
/// [`gpuFree`] is called on the pointer.
#[derive(Debug)]
pub struct DevicePointer<T> {
    pub(crate) ptr: *mut T,

    /// The number of bytes allocated against `ptr`.
    size: usize,
}

// The device memory is exclusively owned by this struct.
unsafe impl<T: Send> Send for DevicePointer<T> {}

impl<T> Drop for DevicePointer<T> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                gpuFree(self.ptr.cast());
            }
        }
    }
}

impl<T> DevicePointer<T> {
    /// Get a const pointer to the device memory.
    pub fn get(&self) -> *const T {
        self.ptr as *const T
    }

    /// Get a mutable pointer to the device memory.
    pub fn get_mut(&mut self) -> *mut T {
        self.ptr
    }

    /// The the number of bytes allocated in this [`DevicePointer`].
    pub fn get_size(&self) -> usize {
        self.size
    }

    /// Get the number of elements allocated against the buffer.
    pub fn get_num_elements(&self) -> usize {
        self.size / std::mem::size_of::<T>()
    }

    /// Allocate a number of bytes on the device.
    #[track_caller]
    pub fn malloc(size: usize) -> Result<DevicePointer<T>, GpuError> {
        if size == 0 {
            Ok(Self::default())
        } else {
            let mut d_ptr = std::ptr::null_mut();
            unsafe {
                gpuMalloc(&mut d_ptr, size);
                check_for_errors(GpuCall::Malloc)?;
            }
            Ok(Self {
                ptr: d_ptr.cast(),
                size,
            })
        }
    }

    /// Copy a slice of data to the device. Any type is allowed, and the returned
    /// pointer is to the device memory.
    #[track_caller]
    pub fn copy_to_device(v: &[T]) -> Result<DevicePointer<T>, GpuError> {
        let size = std::mem::size_of_val(v);
        unsafe {
            let mut d_ptr = Self::malloc(size)?;
            gpuMemcpy(
                d_ptr.get_mut().cast(),
                v.as_ptr().cast(),
                size,
                gpuMemcpyHostToDevice,
            );
            check_for_errors(GpuCall::CopyToDevice)?;
            Ok(d_ptr)
        }
    }

    /// Copy a slice of data from the device. There must be an equal number of
    /// bytes in the `DevicePointer` and `v`. The contents of `v` are
    /// overwritten.
    #[track_caller]
    pub fn copy_from_device(&self, v: &mut [T]) -> Result<(), GpuError> {
        let location = Location::caller();
        if self.ptr.is_null() {
            return Err(GpuError::CopyFromDevice {
                msg: "Attempted to copy data from a null device pointer".into(),
                file: location.file(),
                line: location.line(),
            });
        }

        let size = std::mem::size_of_val(v);
        if size != self.size {
            return Err(GpuError::CopyFromDevice {
                msg: format!(
                    "Device buffer size {} is not equal to provided buffer size {size} (length {})",
                    self.size,
                    v.len()
                )
                .into(),
                file: location.file(),
                line: location.line(),
            });
        }

        unsafe {
            gpuMemcpy(
                v.as_mut_ptr().cast(),
                self.ptr.cast(),
                size,
                gpuMemcpyDeviceToHost,
            );
            check_for_errors(GpuCall::CopyFromDevice)
        }
    }

    /// Allocate a new device buffer of the same size and copy the contents of
    /// this one into it.
    #[track_caller]
    pub fn duplicate(&self) -> Result<DevicePointer<T>, GpuError> {
        let mut other = Self::malloc(self.size)?;
        // Nothing to do if self is empty.
        if self.size == 0 {
            return Ok(other);
        }

        unsafe {
            gpuMemcpy(
                other.get_mut().cast(),
                self.get().cast(),
                self.size,
                gpuMemcpyDeviceToDevice,
            );
            check_for_errors(GpuCall::CopyToDevice)?;
        }
        Ok(other)
    }

    /// Clear all of the bytes in the buffer by writing zeros.
    pub fn clear(&mut self) {
        #[cfg(feature = "cuda")]
        use cuda_runtime_sys::cudaMemset as gpuMemset;
        #[cfg(feature = "hip")]
        use hip_sys::hiprt::hipMemset as gpuMemset;

        unsafe {
            if self.size > 0 {
                gpuMemset(self.get_mut().cast(), 0, self.size);
            }
        }
    }
}

impl<T> Default for DevicePointer<T> {
    fn default() -> Self {
        Self {
            ptr: null_mut(),
            size: 0,
        }
    }
}

/// Page-locked host memory, allocated by the GPU runtime so that transfers to
/// and from a device are fast. When this is dropped, [`gpuFreeHost`] is called
/// on the pointer.
#[derive(Debug)]
pub struct PinnedHostPointer<T> {
    ptr: *mut T,

    /// The number of elements allocated against `ptr`.
    len: usize,
}

unsafe impl<T: Send> Send for PinnedHostPointer<T> {}
unsafe impl<T: Sync> Sync for PinnedHostPointer<T> {}

impl<T> Drop for PinnedHostPointer<T> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                gpuFreeHost(self.ptr.cast());
            }
        }
    }
}

impl<T: bytemuck::Pod> PinnedHostPointer<T> {
    /// Allocate zeroed pinned memory for `len` elements.
    #[track_caller]
    pub fn alloc_zeroed(len: usize) -> Result<PinnedHostPointer<T>, GpuError> {
        let size = len * std::mem::size_of::<T>();
        if size == 0 {
            return Ok(Self {
                ptr: null_mut(),
                len: 0,
            });
        }

        let mut h_ptr: *mut c_void = null_mut();
        unsafe {
            gpuHostAlloc(&mut h_ptr, size, 0);
            check_for_errors(GpuCall::HostAlloc)?;
            std::ptr::write_bytes(h_ptr.cast::<u8>(), 0, size);
        }
        Ok(Self {
            ptr: h_ptr.cast(),
            len,
        })
    }

    /// Allocate pinned memory and copy `v` into it.
    #[track_caller]
    pub fn from_slice(v: &[T]) -> Result<PinnedHostPointer<T>, GpuError> {
        let mut p = Self::alloc_zeroed(v.len())?;
        p.as_mut_slice().copy_from_slice(v);
        Ok(p)
    }

    pub fn as_slice(&self) -> &[T] {
        if self.ptr.is_null() {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.ptr.is_null() {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

#[derive(Error, Debug)]
pub enum GpuError {
    #[cfg(feature = "cuda")]
    #[error("{file}:{line}: cudaMemcpy to device failed: {msg}")]
    CopyToDevice {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "hip")]
    #[error("{file}:{line}: hipMemcpy to device failed: {msg}")]
    CopyToDevice {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "cuda")]
    #[error("{file}:{line}: cudaMemcpy from device failed: {msg}")]
    CopyFromDevice {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "hip")]
    #[error("{file}:{line}: hipMemcpy from device failed: {msg}")]
    CopyFromDevice {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "cuda")]
    #[error("{file}:{line}: cudaMalloc error: {msg}")]
    Malloc {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "hip")]
    #[error("{file}:{line}: hipMalloc error: {msg}")]
    Malloc {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "cuda")]
    #[error("{file}:{line}: cudaHostAlloc error: {msg}")]
    HostAlloc {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "hip")]
    #[error("{file}:{line}: hipHostMalloc error: {msg}")]
    HostAlloc {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "cuda")]
    #[error("{file}:{line}: CUDA kernel error: {msg}")]
    Kernel {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "hip")]
    #[error("{file}:{line}: HIP kernel error: {msg}")]
    Kernel {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "cuda")]
    #[error("{file}:{line}: {msg}")]
    Generic {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },

    #[cfg(feature = "hip")]
    #[error("{file}:{line}: {msg}")]
    Generic {
        msg: Box<str>,
        file: &'static str,
        line: u32,
    },
}
