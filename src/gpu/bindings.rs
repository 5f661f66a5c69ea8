// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// Declarations of the functions exported by the code in src_gpu. Every
// function returns a null pointer on success, or a pointer to a static GPU
// error string.

use std::os::raw::{c_char, c_int, c_uint};

extern "C" {
    pub(crate) fn decode_voltages(
        d_raw: *const u8,
        d_out: *mut i8,
        n_words: usize,
        n_frequencies: c_uint,
        n_antennas: c_uint,
        n_integration_steps: c_uint,
        edge: c_uint,
    ) -> *const c_char;

    pub(crate) fn get_gpu_device_count(count: *mut c_int) -> *const c_char;

    pub(crate) fn get_gpu_device_info(
        device: c_int,
        name: *mut c_char,
        device_major: *mut c_int,
        device_minor: *mut c_int,
        total_global_mem: *mut usize,
        driver_version: *mut c_int,
        runtime_version: *mut c_int,
    ) -> *const c_char;
}
