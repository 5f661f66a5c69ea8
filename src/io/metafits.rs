// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Correlator input mappings from MWA metafits files.

use std::path::Path;

use log::debug;
use mwalib::{MetafitsContext, Pol};

use super::MetafitsError;

/// Map each correlator input to the position of its signal in antenna order:
/// `2 * antenna` for the X polarisation, `2 * antenna + 1` for Y.
pub fn read_metafits_mapping<P: AsRef<Path>>(metafits: P) -> Result<Vec<usize>, MetafitsError> {
    let context = MetafitsContext::new(metafits.as_ref(), None)?;
    let mapping = input_mapping(
        context
            .rf_inputs
            .iter()
            .map(|rf| (rf.input, rf.ant, rf.pol)),
    )?;
    debug!(
        "Read the mapping of {} inputs from '{}'",
        mapping.len(),
        metafits.as_ref().display()
    );
    Ok(mapping)
}

/// Build the mapping from `(input, antenna, polarisation)` triples. Inputs
/// must be unique and cover `0..n`.
pub(super) fn input_mapping<I>(rf_inputs: I) -> Result<Vec<usize>, MetafitsError>
where
    I: ExactSizeIterator<Item = (u32, u32, Pol)>,
{
    let count = rf_inputs.len();
    let mut mapping = vec![0; count];
    for (input, ant, pol) in rf_inputs {
        let slot = mapping
            .get_mut(input as usize)
            .ok_or(MetafitsError::BadInput { input, count })?;
        *slot = 2 * ant as usize + usize::from(pol != Pol::X);
    }
    Ok(mapping)
}
