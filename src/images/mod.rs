// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Image cubes.
//!
//! Pixels are ordered `[interval][channel][row][column]`; every image is a
//! square of `side x side` pixels.

mod error;

pub use error::ImagesError;

use std::path::{Path, PathBuf};

use log::{debug, trace};
use ndarray::ArrayView2;
use num_complex::Complex;

use crate::{
    buffer::{BufferError, MemoryBuffer},
    fits::{FitsContainer, Hdu},
    io::create_directory,
    obs_info::ObservationInfo,
    voltages::integration_intervals,
};

#[derive(Debug)]
pub struct Images {
    obs_info: ObservationInfo,
    integration_steps: u32,
    averaged_channels: u32,
    side: usize,

    /// Right ascension of the phase centre \[degrees\]
    pub ra_deg: f64,

    /// Declination of the phase centre \[degrees\]
    pub dec_deg: f64,

    /// Pixel scales along RA and Dec. These differ when the UV coverage
    /// does \[degrees\]
    pub pixscale_ra: f64,
    pub pixscale_dec: f64,

    /// One flag per image. Empty means nothing is flagged.
    flags: Vec<bool>,

    data: MemoryBuffer<Complex<f32>>,
}

impl Images {
    /// The number of pixels needed for the images of this observation.
    pub fn num_elements(
        obs: &ObservationInfo,
        integration_steps: u32,
        averaged_channels: u32,
        side: usize,
    ) -> Result<usize, ImagesError> {
        obs.validate()?;
        if integration_steps == 0 {
            return Err(ImagesError::ZeroIntegrationSteps);
        }
        if side == 0 {
            return Err(ImagesError::ZeroSide);
        }
        let n_frequencies = obs.averaged_frequencies(averaged_channels)? as usize;
        Ok(integration_intervals(obs.n_timesteps, integration_steps) * n_frequencies * side * side)
    }

    pub fn new(
        data: MemoryBuffer<Complex<f32>>,
        obs_info: ObservationInfo,
        integration_steps: u32,
        averaged_channels: u32,
        side: usize,
    ) -> Result<Images, ImagesError> {
        let expected = Self::num_elements(&obs_info, integration_steps, averaged_channels, side)?;
        if data.len() != expected {
            return Err(ImagesError::BufferLength {
                got: data.len(),
                expected,
            });
        }
        Ok(Images {
            obs_info,
            integration_steps,
            averaged_channels,
            side,
            ra_deg: 0.0,
            dec_deg: 0.0,
            pixscale_ra: 0.0,
            pixscale_dec: 0.0,
            flags: vec![],
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

    pub fn integration_intervals(&self) -> usize {
        integration_intervals(self.obs_info.n_timesteps, self.integration_steps)
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// The number of pixels in one image.
    pub fn image_size(&self) -> usize {
        self.side * self.side
    }

    /// The number of images.
    pub fn size(&self) -> usize {
        self.integration_intervals() * self.n_frequencies()
    }

    /// Where the image of `(interval, ch)` starts.
    #[inline]
    pub fn offset(&self, interval: usize, ch: usize) -> usize {
        let image_size = self.image_size();
        interval * self.n_frequencies() * image_size + ch * image_size
    }

    /// # Panics
    ///
    /// Panics if the interval or channel is out of range.
    pub fn at(&self, interval: usize, ch: usize) -> Result<&[Complex<f32>], BufferError> {
        let start = self.offset(interval, ch);
        Ok(&self.data.as_slice()?[start..start + self.image_size()])
    }

    pub fn at_mut(
        &mut self,
        interval: usize,
        ch: usize,
    ) -> Result<&mut [Complex<f32>], BufferError> {
        let start = self.offset(interval, ch);
        let image_size = self.image_size();
        Ok(&mut self.data.as_mut_slice()?[start..start + image_size])
    }

    /// View one image as `[row][column]`.
    pub fn plane(&self, interval: usize, ch: usize) -> Result<ArrayView2<Complex<f32>>, ImagesError> {
        Ok(ArrayView2::from_shape(
            (self.side, self.side),
            self.at(interval, ch)?,
        )?)
    }

    /// Set one flag per image, ordered `[interval][channel]`.
    pub fn set_flags(&mut self, flags: Vec<bool>) -> Result<(), ImagesError> {
        if flags.len() != self.size() {
            return Err(ImagesError::FlagsLength {
                got: flags.len(),
                expected: self.size(),
            });
        }
        self.flags = flags;
        Ok(())
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    pub fn is_flagged(&self, interval: usize, ch: usize) -> bool {
        if self.flags.is_empty() {
            return false;
        }
        self.flags[self.n_frequencies() * interval + ch]
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

    pub fn try_clone(&self) -> Result<Images, BufferError> {
        Ok(Images {
            obs_info: self.obs_info.clone(),
            integration_steps: self.integration_steps,
            averaged_channels: self.averaged_channels,
            side: self.side,
            ra_deg: self.ra_deg,
            dec_deg: self.dec_deg,
            pixscale_ra: self.pixscale_ra,
            pixscale_dec: self.pixscale_dec,
            flags: self.flags.clone(),
            data: self.data.try_clone()?,
        })
    }

    /// The path (without suffix) of the files for the image of
    /// `(interval, ch)` in `dir`.
    pub fn file_stem<P: AsRef<Path>>(&self, dir: P, interval: usize, ch: usize) -> PathBuf {
        dir.as_ref().join(format!(
            "start_time_{}_int_{interval:02}_coarse_{:03}_fine_ch{ch:02}",
            self.obs_info.start_time, self.obs_info.coarse_channel
        ))
    }

    /// Write every image to its own FITS file in `dir` (created if needed).
    /// Device-resident images are moved to the host first.
    ///
    /// With `save_as_complex`, each `*_image.fits` holds `side` rows of
    /// interleaved real and imaginary parts. Otherwise the real parts go to
    /// `*_image_real.fits` and, with `save_imaginary`, the imaginary parts
    /// go to `*_image_imag.fits`.
    pub fn to_fits_files<P: AsRef<Path>>(
        &mut self,
        dir: P,
        save_as_complex: bool,
        save_imaginary: bool,
    ) -> Result<(), ImagesError> {
        let dir = dir.as_ref();
        if self.data.is_on_device() {
            self.to_host()?;
        }
        create_directory(dir).map_err(|err| ImagesError::CreateDir {
            dir: dir.to_path_buf(),
            err,
        })?;
        debug!(
            "Writing {} images of {}x{} pixels to '{}'",
            self.size(),
            self.side,
            self.side,
            dir.display()
        );

        let side = self.side;
        for interval in 0..self.integration_intervals() {
            for ch in 0..self.n_frequencies() {
                let stem = self.file_stem(dir, interval, ch).display().to_string();
                let image = self.at(interval, ch)?;
                if save_as_complex {
                    let floats: Vec<f32> = bytemuck::cast_slice(image).to_vec();
                    self.write_image(format!("{stem}_image.fits"), floats, side, side * 2)?;
                } else {
                    let real = image.iter().map(|c| c.re).collect::<Vec<_>>();
                    self.write_image(format!("{stem}_image_real.fits"), real, side, side)?;
                    if save_imaginary {
                        let imag = image.iter().map(|c| c.im).collect::<Vec<_>>();
                        self.write_image(format!("{stem}_image_imag.fits"), imag, side, side)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_image(
        &self,
        file: String,
        pixels: Vec<f32>,
        x: usize,
        y: usize,
    ) -> Result<(), ImagesError> {
        trace!("Writing '{file}'");
        let mut hdu = Hdu::new();
        hdu.set_image(pixels, x, y)?;
        hdu.add_keyword("CTYPE1", "RA---SIN", "");
        hdu.add_keyword("CRPIX1", (x / 2 + 1) as i64, "");
        hdu.add_keyword("CDELT1", self.pixscale_ra, "Pixscale");
        hdu.add_keyword("CRVAL1", self.ra_deg, "RA value in deg.");
        hdu.add_keyword("CUNIT1", "deg", "");

        hdu.add_keyword("CTYPE2", "DEC--SIN", "");
        hdu.add_keyword("CRPIX2", (y / 2 + 1) as i64, "");
        hdu.add_keyword("CDELT2", self.pixscale_dec, "Pixscale");
        hdu.add_keyword("CRVAL2", self.dec_deg, "DEC value in deg.");
        hdu.add_keyword("CUNIT2", "deg", "");

        let mut container = FitsContainer::new();
        container.push(hdu);
        container.to_file(file)?;
        Ok(())
    }
}
