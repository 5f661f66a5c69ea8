// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Make a FITS file written by astroio look like one written by the MWA
//! offline correlator. The correlator declares its images as 32-bit integers
//! (BITPIX 32) but writes floats into them, and some readers rely on that.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::{
    fits::{write_float_as_long, FitsContainer},
    AstroIoError,
};

#[derive(Parser, Debug)]
pub(super) struct AdjustFitsArgs {
    /// The FITS file written by astroio.
    #[clap(name = "INPUT_FITS", parse(from_os_str))]
    pub(super) input: PathBuf,

    /// The file to write. It is overwritten if it exists.
    #[clap(name = "OUTPUT_FITS", parse(from_os_str))]
    pub(super) output: PathBuf,
}

impl AdjustFitsArgs {
    pub(super) fn run(self) -> Result<(), AstroIoError> {
        let container = FitsContainer::from_file(&self.input)?;
        info!(
            "Read {} HDUs from {}",
            container.len(),
            self.input.display()
        );
        write_float_as_long(&container, &self.output)?;
        info!("Wrote {}", self.output.display());
        Ok(())
    }
}
