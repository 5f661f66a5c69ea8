// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Correlated visibilities.
//!
//! Visibilities are ordered `[interval][channel][baseline][pol][pol]`. A
//! baseline is an unordered pair of antennas (auto-correlations included),
//! enumerated in row-major upper-triangular order; see [`baseline_index`].
//! Only one of the two Hermitian halves of each correlation matrix is held,
//! so swapping the antennas addresses the same block.

mod error;

pub use error::VisibilitiesError;

use std::path::Path;

use log::debug;
use ndarray::ArrayView5;
use num_complex::Complex;

use crate::{
    buffer::{BufferError, MemoryBuffer},
    fits::{FitsContainer, Hdu, ImageData},
    obs_info::ObservationInfo,
    voltages::integration_intervals,
};

/// The index of the baseline formed by antennas `a1` and `a2`. The order of
/// the antennas doesn't matter.
#[inline]
pub fn baseline_index(a1: usize, a2: usize) -> usize {
    let (lo, hi) = if a1 <= a2 { (a1, a2) } else { (a2, a1) };
    hi * (hi + 1) / 2 + lo
}

/// The number of baselines (including auto-correlations) of `n_antennas`
/// antennas.
pub fn num_baselines(n_antennas: usize) -> usize {
    n_antennas * (n_antennas + 1) / 2
}

#[derive(Debug)]
pub struct Visibilities {
    obs_info: ObservationInfo,
    integration_steps: u32,
    averaged_channels: u32,
    data: MemoryBuffer<Complex<f32>>,
}

impl Visibilities {
    /// The number of visibilities needed for this observation after
    /// integrating `integration_steps` timesteps and averaging
    /// `averaged_channels` channels.
    pub fn num_elements(
        obs: &ObservationInfo,
        integration_steps: u32,
        averaged_channels: u32,
    ) -> Result<usize, VisibilitiesError> {
        obs.validate()?;
        if integration_steps == 0 {
            return Err(VisibilitiesError::ZeroIntegrationSteps);
        }
        let n_frequencies = obs.averaged_frequencies(averaged_channels)? as usize;
        let n_pols = obs.n_polarisations as usize;
        Ok(integration_intervals(obs.n_timesteps, integration_steps)
            * n_frequencies
            * num_baselines(obs.n_antennas as usize)
            * n_pols
            * n_pols)
    }

    pub fn new(
        data: MemoryBuffer<Complex<f32>>,
        obs_info: ObservationInfo,
        integration_steps: u32,
        averaged_channels: u32,
    ) -> Result<Visibilities, VisibilitiesError> {
        let expected = Self::num_elements(&obs_info, integration_steps, averaged_channels)?;
        if data.len() != expected {
            return Err(VisibilitiesError::BufferLength {
                got: data.len(),
                expected,
            });
        }
        Ok(Visibilities {
            obs_info,
            integration_steps,
            averaged_channels,
            data,
        })
    }

    pub fn obs_info(&self) -> &ObservationInfo {
        &self.obs_info
    }

    pub fn integration_steps(&self) -> u32 {
        self.integration_steps
    }

    pub fn averaged_channels(&self) -> u32 {
        self.averaged_channels
    }

    /// The number of channels after averaging.
    pub fn n_frequencies(&self) -> usize {
        (self.obs_info.n_frequencies / self.averaged_channels) as usize
    }

    pub fn n_baselines(&self) -> usize {
        num_baselines(self.obs_info.n_antennas as usize)
    }

    pub fn integration_intervals(&self) -> usize {
        integration_intervals(self.obs_info.n_timesteps, self.integration_steps)
    }

    /// The number of visibilities in one channel of one interval.
    pub fn matrix_size(&self) -> usize {
        let n_pols = self.obs_info.n_polarisations as usize;
        self.n_baselines() * n_pols * n_pols
    }

    /// The total number of visibilities.
    pub fn size(&self) -> usize {
        self.integration_intervals() * self.n_frequencies() * self.matrix_size()
    }

    /// Where the polarisation block of baseline `(a1, a2)` starts.
    #[inline]
    pub fn offset(&self, interval: usize, ch: usize, a1: usize, a2: usize) -> usize {
        let n_pols = self.obs_info.n_polarisations as usize;
        let matrix_size = self.matrix_size();
        interval * self.n_frequencies() * matrix_size
            + ch * matrix_size
            + baseline_index(a1, a2) * n_pols * n_pols
    }

    /// The `pols x pols` block of baseline `(a1, a2)`. This is the same block
    /// for `(a2, a1)`; conjugate-transposing it is up to the caller.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    pub fn at(
        &self,
        interval: usize,
        ch: usize,
        a1: usize,
        a2: usize,
    ) -> Result<&[Complex<f32>], BufferError> {
        let start = self.offset(interval, ch, a1, a2);
        let n_pols = self.obs_info.n_polarisations as usize;
        Ok(&self.data.as_slice()?[start..start + n_pols * n_pols])
    }

    pub fn at_mut(
        &mut self,
        interval: usize,
        ch: usize,
        a1: usize,
        a2: usize,
    ) -> Result<&mut [Complex<f32>], BufferError> {
        let start = self.offset(interval, ch, a1, a2);
        let n_pols = self.obs_info.n_polarisations as usize;
        Ok(&mut self.data.as_mut_slice()?[start..start + n_pols * n_pols])
    }

    /// View the visibilities with dimensions `[interval][channel][baseline][pol][pol]`.
    pub fn as_array(&self) -> Result<ArrayView5<Complex<f32>>, VisibilitiesError> {
        let n_pols = self.obs_info.n_polarisations as usize;
        let shape = (
            self.integration_intervals(),
            self.n_frequencies(),
            self.n_baselines(),
            n_pols,
            n_pols,
        );
        Ok(ArrayView5::from_shape(shape, self.data.as_slice()?)?)
    }

    pub fn buffer(&self) -> &MemoryBuffer<Complex<f32>> {
        &self.data
    }

    pub fn buffer_mut(&mut self) -> &mut MemoryBuffer<Complex<f32>> {
        &mut self.data
    }

    pub fn into_buffer(self) -> MemoryBuffer<Complex<f32>> {
        self.data
    }

    pub fn to_host(&mut self) -> Result<(), BufferError> {
        self.data.to_host(false)
    }

    pub fn to_device(&mut self) -> Result<(), BufferError> {
        self.data.to_device()
    }

    pub fn try_clone(&self) -> Result<Visibilities, BufferError> {
        Ok(Visibilities {
            obs_info: self.obs_info.clone(),
            integration_steps: self.integration_steps,
            averaged_channels: self.averaged_channels,
            data: self.data.try_clone()?,
        })
    }

    /// Write the visibilities in the MWA offline correlator's format: one HDU
    /// per integration interval, each a single precision image of one row per
    /// channel, each row holding the interleaved real and imaginary parts of
    /// the channel's matrix.
    pub fn to_fits_file<P: AsRef<Path>>(&self, file: P) -> Result<(), VisibilitiesError> {
        let data = self.data.to_vec()?;
        let n_frequencies = self.n_frequencies();
        let matrix_size = self.matrix_size();
        let integration_time = self.obs_info.time_resolution * self.integration_steps as f64;

        let mut container = FitsContainer::new();
        for (interval, interval_data) in data.chunks_exact(n_frequencies * matrix_size).enumerate()
        {
            let ms_elapsed = (interval as f64 * integration_time * 1e3) as i64;
            let floats: Vec<f32> = bytemuck::cast_slice(interval_data).to_vec();
            let mut hdu = Hdu::new();
            hdu.set_image(floats, n_frequencies, matrix_size * 2)?;
            hdu.add_keyword("TIME", self.obs_info.start_time, "Unix time (seconds)");
            hdu.add_keyword("MILLITIM", ms_elapsed, "Milliseconds since TIME");
            hdu.add_keyword("INTTIME", integration_time, "Integration time (s)");
            hdu.add_keyword(
                "COARSE_CHAN",
                self.obs_info.coarse_channel,
                "Receiver Coarse Channel Number (only used in offline mode)",
            );
            container.push(hdu);
        }
        container.to_file(file)?;
        Ok(())
    }

    /// Read visibilities written by [`Visibilities::to_fits_file`] (or the
    /// MWA offline correlator). The integration time sets the number of
    /// integration steps, whose intervals must match the HDUs, and the
    /// frequency axis sets the channel averaging. The start time and coarse channel come from the file; the
    /// rest of the observation's description comes from `obs`.
    pub fn from_fits_file<P: AsRef<Path>>(
        file: P,
        obs: &ObservationInfo,
    ) -> Result<Visibilities, VisibilitiesError> {
        let file = file.as_ref();
        obs.validate()?;
        let container = FitsContainer::from_file(file)?;
        let n_hdus = container.len();
        if n_hdus == 0 {
            return Err(VisibilitiesError::NoHdus {
                file: file.to_path_buf(),
            });
        }
        let mut obs_info = obs.clone();
        let first = &container[0];
        obs_info.start_time = first.get_keyword::<i64>("TIME")?.0;
        obs_info.coarse_channel = first.get_keyword::<u32>("COARSE_CHAN")?.0;
        let (ms_elapsed, _) = first.get_keyword::<i64>("MILLITIM")?;
        let (integration_time, _) = first.get_keyword::<f64>("INTTIME")?;
        debug!("'{}': MILLITIM {ms_elapsed}, INTTIME {integration_time}", file.display());

        // The last interval may be padded, so the steps come from the
        // integration time rather than the HDU count.
        let integration_steps = (integration_time / obs_info.time_resolution).round();
        let integration_steps = if integration_steps.is_finite() && integration_steps >= 1.0 {
            integration_steps as u32
        } else {
            0
        };
        let expected = match integration_steps {
            0 => 0,
            n => integration_intervals(obs_info.n_timesteps, n),
        };
        if expected != n_hdus {
            return Err(VisibilitiesError::Intervals {
                file: file.to_path_buf(),
                n_hdus,
                n_timesteps: obs_info.n_timesteps,
                integration_steps,
                expected,
            });
        }

        let n_pols = obs_info.n_polarisations as usize;
        let matrix_size = num_baselines(obs_info.n_antennas as usize) * n_pols * n_pols;
        let n_frequencies = first.x_dim();
        let averaged_channels = match n_frequencies {
            0 => 0,
            n => obs_info.n_frequencies / n as u32,
        };

        let mut data: Vec<Complex<f32>> = Vec::with_capacity(n_hdus * n_frequencies * matrix_size);
        for (i_hdu, hdu) in container.iter().enumerate() {
            if hdu.y_dim() != matrix_size * 2 {
                return Err(VisibilitiesError::MatrixAxis {
                    file: file.to_path_buf(),
                    hdu: i_hdu,
                    got: hdu.y_dim(),
                    expected: matrix_size * 2,
                });
            }
            if hdu.x_dim() != n_frequencies {
                return Err(VisibilitiesError::FrequencyAxis {
                    file: file.to_path_buf(),
                    hdu: i_hdu,
                    got: hdu.x_dim(),
                    expected: n_frequencies,
                });
            }
            match hdu.image() {
                Some(ImageData::Float(floats)) => data.extend(
                    floats
                        .chunks_exact(2)
                        .map(|re_im| Complex::new(re_im[0], re_im[1])),
                ),
                _ => {
                    return Err(VisibilitiesError::NotFloat {
                        file: file.to_path_buf(),
                        hdu: i_hdu,
                    })
                }
            }
        }

        Visibilities::new(
            MemoryBuffer::from_vec(data)?,
            obs_info,
            integration_steps,
            averaged_channels,
        )
    }
}
