// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Raw voltages reshaped for integration.
//!
//! Raw captures are ordered `[timestep][channel][antenna][polarisation]`, each
//! complex sample packed into one byte (two 4-bit nibbles). [`Voltages`] holds
//! them as [`Complex<i8>`] ordered
//! `[integration interval][channel][antenna][polarisation][integration step]`,
//! so that the samples a correlator sums over are contiguous. The number of
//! intervals is rounded up; padding at the end of the last interval is zero.

mod error;
#[cfg(test)]
mod tests;

pub use error::VoltageError;

use std::{
    fs::File,
    io::{ErrorKind, Read},
    path::Path,
};

use log::{debug, trace, warn};
use num_complex::Complex;
use rayon::prelude::*;

use crate::{
    buffer::{BufferError, MemoryBuffer, MemoryKind},
    constants::{BYTES_PER_RAW_WORD, DEFAULT_TIMESTEPS_PER_READ, NUM_POLS},
    decode::{decode_pair, init_lookup},
    device::DecodeDevice,
    io::read_data_from_file,
    obs_info::ObservationInfo,
};

// Device and dump code treat these samples as pairs of bytes.
static_assertions::assert_eq_size!(Complex<i8>, [i8; 2]);

/// Knobs for reshaping packed captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReshapeOptions {
    /// How many timesteps are read (and decoded) at once. A trailing part of
    /// the input smaller than this is ignored.
    pub timesteps_per_read: usize,

    /// The number of channels at each edge of the band whose samples are set
    /// to zero rather than decoded.
    pub edge: u32,

    /// Use pinned host memory for the output (GPU builds only).
    pub pinned: bool,
}

impl Default for ReshapeOptions {
    fn default() -> Self {
        ReshapeOptions {
            timesteps_per_read: DEFAULT_TIMESTEPS_PER_READ,
            edge: 0,
            pinned: false,
        }
    }
}

/// Strides of the reshaped voltage layout, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoltageStrides {
    /// Also the number of integration steps.
    pub samples_in_pol: usize,
    pub samples_in_antenna: usize,
    pub samples_in_frequency: usize,
    pub samples_in_interval: usize,
}

impl VoltageStrides {
    pub fn new(obs: &ObservationInfo, integration_steps: u32) -> VoltageStrides {
        let samples_in_pol = integration_steps as usize;
        let samples_in_antenna = samples_in_pol * obs.n_polarisations as usize;
        let samples_in_frequency = samples_in_antenna * obs.n_antennas as usize;
        let samples_in_interval = samples_in_frequency * obs.n_frequencies as usize;
        VoltageStrides {
            samples_in_pol,
            samples_in_antenna,
            samples_in_frequency,
            samples_in_interval,
        }
    }

    /// The position of a sample in the reshaped layout.
    #[inline]
    pub fn index(&self, interval: usize, ch: usize, ant: usize, pol: usize, step: usize) -> usize {
        interval * self.samples_in_interval
            + ch * self.samples_in_frequency
            + ant * self.samples_in_antenna
            + pol * self.samples_in_pol
            + step
    }
}

/// The number of integration intervals needed to hold `n_timesteps`.
pub fn integration_intervals(n_timesteps: u32, integration_steps: u32) -> usize {
    (n_timesteps as usize).div_ceil(integration_steps as usize)
}

/// Voltages of an observation in integration order. See the module
/// documentation for the layout.
#[derive(Debug)]
pub struct Voltages {
    obs_info: ObservationInfo,
    integration_steps: u32,
    data: MemoryBuffer<Complex<i8>>,
}

impl Voltages {
    /// The number of samples a [`Voltages`] needs for this observation,
    /// including padding.
    pub fn num_elements(obs: &ObservationInfo, integration_steps: u32) -> usize {
        integration_intervals(obs.n_timesteps, integration_steps)
            * VoltageStrides::new(obs, integration_steps).samples_in_interval
    }

    /// Wrap already-reshaped voltages.
    pub fn new(
        data: MemoryBuffer<Complex<i8>>,
        obs_info: ObservationInfo,
        integration_steps: u32,
    ) -> Result<Voltages, VoltageError> {
        obs_info.validate()?;
        if integration_steps == 0 {
            return Err(VoltageError::ZeroIntegrationSteps);
        }
        let expected = Self::num_elements(&obs_info, integration_steps);
        if data.len() != expected {
            return Err(VoltageError::BufferLength {
                got: data.len(),
                expected,
            });
        }
        Ok(Voltages {
            obs_info,
            integration_steps,
            data,
        })
    }

    /// Read and reshape a packed capture (e.g. an MWA VCS .dat file) chunk by
    /// chunk.
    pub fn from_dat_file<P: AsRef<Path>>(
        file: P,
        obs: &ObservationInfo,
        integration_steps: u32,
        options: ReshapeOptions,
    ) -> Result<Voltages, VoltageError> {
        let file = file.as_ref();
        debug!("Reading voltages from '{}'", file.display());
        let reader = File::open(file).map_err(|err| VoltageError::Read {
            file: file.to_path_buf(),
            err,
        })?;
        Self::from_packed_reader(reader, obs, integration_steps, options).map_err(|e| match e {
            VoltageError::Read { err, .. } => VoltageError::Read {
                file: file.to_path_buf(),
                err,
            },
            e => e,
        })
    }

    /// Reshape packed voltages from any reader, `options.timesteps_per_read`
    /// timesteps at a time. This is strictly sequential.
    pub fn from_packed_reader<R: Read>(
        mut reader: R,
        obs: &ObservationInfo,
        integration_steps: u32,
        options: ReshapeOptions,
    ) -> Result<Voltages, VoltageError> {
        let strides = validate_packed(obs, integration_steps, &options)?;
        init_lookup();

        let bytes_per_timestep = packed_bytes_per_timestep(obs);
        let bytes_per_read = options.timesteps_per_read * bytes_per_timestep;
        let n_timesteps = obs.n_timesteps as usize;
        let mut data = MemoryBuffer::new(
            Self::num_elements(obs, integration_steps),
            host_kind(options.pinned),
        )?;
        let out = data.as_mut_slice()?;

        let mut chunk = vec![0_u8; bytes_per_read];
        let mut total_timesteps = 0;
        loop {
            let n_read = read_chunk(&mut reader, &mut chunk).map_err(|err| VoltageError::Read {
                file: "<stream>".into(),
                err,
            })?;
            if n_read < bytes_per_read {
                if n_read > 0 {
                    warn!("Ignoring {n_read} trailing bytes that don't make up a full read of {} timesteps", options.timesteps_per_read);
                }
                break;
            }
            if total_timesteps >= n_timesteps {
                debug!("Ignoring data beyond the observation's {n_timesteps} timesteps");
                break;
            }

            let n_chunk_timesteps = options.timesteps_per_read.min(n_timesteps - total_timesteps);
            scatter_packed_chunk(
                &chunk,
                total_timesteps,
                n_chunk_timesteps,
                obs,
                &strides,
                options.edge,
                out,
            );
            total_timesteps += n_chunk_timesteps;
            trace!("Decoded {total_timesteps} timesteps");
        }
        debug!("Decoded {total_timesteps} of {n_timesteps} timesteps");

        Ok(Voltages {
            obs_info: obs.clone(),
            integration_steps,
            data,
        })
    }

    /// Read and reshape a packed capture with a data-parallel decode on the
    /// best available device. The result is identical to
    /// [`Voltages::from_dat_file`]'s. If a GPU is used, the voltages are left
    /// on it.
    pub fn from_dat_file_parallel<P: AsRef<Path>>(
        file: P,
        obs: &ObservationInfo,
        integration_steps: u32,
        options: ReshapeOptions,
    ) -> Result<Voltages, VoltageError> {
        let file = file.as_ref();
        debug!("Reading voltages from '{}'", file.display());
        let raw = read_data_from_file(file).map_err(|err| VoltageError::Read {
            file: file.to_path_buf(),
            err,
        })?;
        Self::from_packed_parallel(&raw, obs, integration_steps, options, DecodeDevice::pick())
    }

    /// Reshape in-memory packed voltages with a data-parallel decode on
    /// `device`. Every output sample is computed independently of the others.
    pub fn from_packed_parallel(
        raw: &[u8],
        obs: &ObservationInfo,
        integration_steps: u32,
        options: ReshapeOptions,
        device: DecodeDevice,
    ) -> Result<Voltages, VoltageError> {
        let strides = validate_packed(obs, integration_steps, &options)?;
        let bytes_per_read = options.timesteps_per_read * packed_bytes_per_timestep(obs);
        // Only whole reads are decoded, like the streaming path does.
        let n_full_reads = raw.len() / bytes_per_read;
        let leftover = raw.len() % bytes_per_read;
        if leftover > 0 {
            warn!("Ignoring {leftover} trailing bytes that don't make up a full read of {} timesteps", options.timesteps_per_read);
        }
        let n_decoded = (n_full_reads * options.timesteps_per_read).min(obs.n_timesteps as usize);
        let n_elements = Self::num_elements(obs, integration_steps);
        debug!("Decoding {n_decoded} timesteps on {device:?}");

        let data = match device {
            DecodeDevice::Cpu => {
                let mut data = MemoryBuffer::new(n_elements, host_kind(options.pinned))?;
                decode_packed_on_cpu(
                    raw,
                    n_decoded,
                    obs,
                    &strides,
                    options.edge,
                    data.as_mut_slice()?,
                );
                data
            }

            #[cfg(any(feature = "cuda", feature = "hip"))]
            DecodeDevice::Gpu => {
                decode_packed_on_gpu(raw, n_decoded, obs, integration_steps, options.edge, n_elements)?
            }
        };

        Ok(Voltages {
            obs_info: obs.clone(),
            integration_steps,
            data,
        })
    }

    /// Reshape voltages that have already been expanded to one signed byte per
    /// real/imaginary component. `buffer` must hold exactly every sample of the
    /// observation.
    pub fn from_memory(
        buffer: &[i8],
        obs: &ObservationInfo,
        integration_steps: u32,
        pinned: bool,
    ) -> Result<Voltages, VoltageError> {
        obs.validate()?;
        if integration_steps == 0 {
            return Err(VoltageError::ZeroIntegrationSteps);
        }
        let expected = obs.num_samples() * 2;
        if buffer.len() != expected {
            return Err(VoltageError::SizeMismatch {
                got: buffer.len(),
                expected,
            });
        }

        let strides = VoltageStrides::new(obs, integration_steps);
        let n_int = integration_steps as usize;
        let n_pols = obs.n_polarisations as usize;
        let mut data = MemoryBuffer::new(
            Self::num_elements(obs, integration_steps),
            host_kind(pinned),
        )?;
        let out = data.as_mut_slice()?;
        for (ts, raw_ts) in buffer.chunks_exact(obs.samples_per_timestep() * 2).enumerate() {
            let (interval, step) = (ts / n_int, ts % n_int);
            let raw_channels = raw_ts.chunks_exact(obs.n_antennas as usize * n_pols * 2);
            for (ch, raw_ch) in raw_channels.enumerate() {
                for (ant, raw_ant) in raw_ch.chunks_exact(n_pols * 2).enumerate() {
                    for (pol, re_im) in raw_ant.chunks_exact(2).enumerate() {
                        out[strides.index(interval, ch, ant, pol, step)] =
                            Complex::new(re_im[0], re_im[1]);
                    }
                }
            }
        }

        Ok(Voltages {
            obs_info: obs.clone(),
            integration_steps,
            data,
        })
    }

    /// Read an EDA2 voltage dump (one signed byte per component) and reshape
    /// it with [`Voltages::from_memory`].
    pub fn from_eda2_file<P: AsRef<Path>>(
        file: P,
        obs: &ObservationInfo,
        integration_steps: u32,
        pinned: bool,
    ) -> Result<Voltages, VoltageError> {
        let file = file.as_ref();
        let raw = read_data_from_file(file).map_err(|err| VoltageError::Read {
            file: file.to_path_buf(),
            err,
        })?;
        Self::from_memory(bytemuck::cast_slice(&raw), obs, integration_steps, pinned)
    }

    pub fn obs_info(&self) -> &ObservationInfo {
        &self.obs_info
    }

    pub fn integration_steps(&self) -> u32 {
        self.integration_steps
    }

    pub fn integration_intervals(&self) -> usize {
        integration_intervals(self.obs_info.n_timesteps, self.integration_steps)
    }

    pub fn strides(&self) -> VoltageStrides {
        VoltageStrides::new(&self.obs_info, self.integration_steps)
    }

    /// The number of samples actually recorded (excluding padding).
    pub fn size(&self) -> usize {
        self.obs_info.num_samples()
    }

    /// The number of samples held, including padding.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The integration steps of one antenna's polarisation at one channel and
    /// interval.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    pub fn at(
        &self,
        interval: usize,
        ch: usize,
        ant: usize,
        pol: usize,
    ) -> Result<&[Complex<i8>], BufferError> {
        let start = self.strides().index(interval, ch, ant, pol, 0);
        Ok(&self.data.as_slice()?[start..start + self.integration_steps as usize])
    }

    pub fn buffer(&self) -> &MemoryBuffer<Complex<i8>> {
        &self.data
    }

    pub fn buffer_mut(&mut self) -> &mut MemoryBuffer<Complex<i8>> {
        &mut self.data
    }

    pub fn into_buffer(self) -> MemoryBuffer<Complex<i8>> {
        self.data
    }

    pub fn to_host(&mut self) -> Result<(), BufferError> {
        self.data.to_host(false)
    }

    pub fn to_device(&mut self) -> Result<(), BufferError> {
        self.data.to_device()
    }

    /// Deep copy, keeping the kind of memory.
    pub fn try_clone(&self) -> Result<Voltages, BufferError> {
        Ok(Voltages {
            obs_info: self.obs_info.clone(),
            integration_steps: self.integration_steps,
            data: self.data.try_clone()?,
        })
    }
}

fn host_kind(pinned: bool) -> MemoryKind {
    if pinned {
        MemoryKind::HostPinned
    } else {
        MemoryKind::HostHeap
    }
}

/// Bytes of one timestep of a packed capture.
fn packed_bytes_per_timestep(obs: &ObservationInfo) -> usize {
    obs.n_frequencies as usize * obs.n_antennas as usize * BYTES_PER_RAW_WORD
}

fn validate_packed(
    obs: &ObservationInfo,
    integration_steps: u32,
    options: &ReshapeOptions,
) -> Result<VoltageStrides, VoltageError> {
    obs.validate()?;
    if integration_steps == 0 {
        return Err(VoltageError::ZeroIntegrationSteps);
    }
    if obs.n_polarisations != NUM_POLS {
        return Err(VoltageError::UnsupportedPolarisations(obs.n_polarisations));
    }
    if options.timesteps_per_read == 0 {
        return Err(VoltageError::ZeroTimestepsPerRead);
    }
    if 2 * options.edge as u64 > obs.n_frequencies as u64 {
        return Err(VoltageError::EdgeTooWide {
            edge: options.edge,
            n_frequencies: obs.n_frequencies,
        });
    }

    let strides = VoltageStrides::new(obs, integration_steps);
    debug!("Voltage strides: {strides:?}");
    Ok(strides)
}

#[inline]
fn is_edge_channel(ch: usize, n_frequencies: usize, edge: u32) -> bool {
    let edge = edge as usize;
    ch < edge || ch >= n_frequencies - edge
}

/// Fill `buf` from `reader`, stopping early only at the end of the input.
/// Returns the number of bytes read.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut n = 0;
    while n < buf.len() {
        match reader.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(k) => n += k,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(n)
}

/// Decode `n_timesteps` packed timesteps from `chunk` (starting at
/// `first_timestep` of the observation) into `out`.
fn scatter_packed_chunk(
    chunk: &[u8],
    first_timestep: usize,
    n_timesteps: usize,
    obs: &ObservationInfo,
    strides: &VoltageStrides,
    edge: u32,
    out: &mut [Complex<i8>],
) {
    let n_frequencies = obs.n_frequencies as usize;
    let n_antennas = obs.n_antennas as usize;
    let n_int = strides.samples_in_pol;
    let zeros = [Complex::new(0, 0); 2];

    let mut sample_idx = 0;
    for ts in first_timestep..first_timestep + n_timesteps {
        let (interval, step) = (ts / n_int, ts % n_int);
        for ch in 0..n_frequencies {
            let edge_channel = is_edge_channel(ch, n_frequencies, edge);
            for ant in 0..n_antennas {
                let [pol0, pol1] = if edge_channel {
                    zeros
                } else {
                    decode_pair(&chunk[sample_idx..sample_idx + BYTES_PER_RAW_WORD])
                };
                let out_index = strides.index(interval, ch, ant, 0, step);
                out[out_index] = pol0;
                out[out_index + n_int] = pol1;
                sample_idx += BYTES_PER_RAW_WORD;
            }
        }
    }
}

/// Decode the first `n_timesteps` of `raw` into the zeroed `out`, one rayon
/// task per integration interval. Each task gathers its own timesteps, so no
/// output sample is written by more than one task.
fn decode_packed_on_cpu(
    raw: &[u8],
    n_timesteps: usize,
    obs: &ObservationInfo,
    strides: &VoltageStrides,
    edge: u32,
    out: &mut [Complex<i8>],
) {
    init_lookup();
    let n_frequencies = obs.n_frequencies as usize;
    let bytes_per_channel = obs.n_antennas as usize * BYTES_PER_RAW_WORD;
    let bytes_per_timestep = n_frequencies * bytes_per_channel;
    let n_int = strides.samples_in_pol;

    out.par_chunks_mut(strides.samples_in_interval)
        .enumerate()
        .for_each(|(interval, block)| {
            let first_ts = interval * n_int;
            let last_ts = (first_ts + n_int).min(n_timesteps);
            for ts in first_ts..last_ts {
                let step = ts - first_ts;
                let raw_ts = &raw[ts * bytes_per_timestep..(ts + 1) * bytes_per_timestep];
                for (ch, raw_ch) in raw_ts.chunks_exact(bytes_per_channel).enumerate() {
                    if is_edge_channel(ch, n_frequencies, edge) {
                        continue;
                    }
                    for (ant, word) in raw_ch.chunks_exact(BYTES_PER_RAW_WORD).enumerate() {
                        let [pol0, pol1] = decode_pair(word);
                        let i = strides.index(0, ch, ant, 0, step);
                        block[i] = pol0;
                        block[i + n_int] = pol1;
                    }
                }
            }
        });
}

/// Decode the first `n_timesteps` of `raw` on the GPU. One GPU thread handles
/// one raw word. The result stays on the device.
#[cfg(any(feature = "cuda", feature = "hip"))]
fn decode_packed_on_gpu(
    raw: &[u8],
    n_timesteps: usize,
    obs: &ObservationInfo,
    integration_steps: u32,
    edge: u32,
    n_elements: usize,
) -> Result<MemoryBuffer<Complex<i8>>, VoltageError> {
    use crate::gpu::{self, DevicePointer};

    let n_words = n_timesteps * obs.n_frequencies as usize * obs.n_antennas as usize;
    let d_raw = DevicePointer::copy_to_device(&raw[..n_words * BYTES_PER_RAW_WORD])?;
    let mut d_out: DevicePointer<Complex<i8>> =
        DevicePointer::malloc(n_elements * std::mem::size_of::<Complex<i8>>())?;
    d_out.clear();
    gpu::gpu_kernel_call!(
        gpu::decode_voltages,
        d_raw.get(),
        d_out.get_mut().cast(),
        n_words,
        obs.n_frequencies,
        obs.n_antennas,
        integration_steps,
        edge,
    )?;
    Ok(MemoryBuffer::from_device_pointer(d_out)?)
}
