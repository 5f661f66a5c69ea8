// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Print where each correlator input goes in antenna/polarisation order.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::{io::read_metafits_mapping, AstroIoError};

#[derive(Parser, Debug)]
pub(super) struct MetafitsMappingArgs {
    #[clap(name = "METAFITS_FILE", parse(from_os_str))]
    pub(super) metafits: PathBuf,
}

impl MetafitsMappingArgs {
    pub(super) fn run(self) -> Result<(), AstroIoError> {
        let mapping = read_metafits_mapping(&self.metafits)?;
        info!(
            "{} inputs in {}; input and antenna/polarisation index follow",
            mapping.len(),
            self.metafits.display()
        );
        for (input, index) in mapping.iter().enumerate() {
            println!("{input} {index}");
        }
        Ok(())
    }
}
