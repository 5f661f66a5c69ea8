// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.
 */

/// The number of timesteps read from a raw capture in one go by the streaming
/// reshaper.
pub const DEFAULT_TIMESTEPS_PER_READ: usize = 100;

/// The number of (complex) voltage samples packed into one raw 16-bit word.
/// Both polarisations of one antenna share a word.
pub const SAMPLES_PER_RAW_WORD: usize = 2;

/// The number of bytes in one raw word.
pub const BYTES_PER_RAW_WORD: usize = 2;

/// The number of polarisations an MWA/EDA2 tile records.
pub const NUM_POLS: u32 = 2;

/// Unix time of the GPS epoch (1980-01-06T00:00:00 UTC).
pub const GPS_EPOCH_AS_UNIX: i64 = 315_964_800;

/// Leap seconds between GPS time and UTC (since 2016-12-31).
pub const GPS_LEAP_SECONDS: i64 = 18;

/// The number of coarse channels making up a full MWA observation band. Each
/// coarse channel of each second of a VCS observation lives in its own .dat
/// file.
pub const NUM_COARSE_CHANNELS: usize = 24;

/// The number of timesteps integrated together when none is given.
pub const DEFAULT_INTEGRATION_STEPS: u32 = 100;
