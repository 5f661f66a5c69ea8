// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnitParseError {
    #[error("Time specification string has zero length")]
    Empty,

    #[error("Time specification '{0}' has more than one decimal point")]
    TooManyDots(String),

    #[error("Time specification '{0}' has no unit; expected one of ms, cs, ds or s")]
    MissingUnit(String),

    #[error("Time specification '{input}' has an unknown unit '{unit}'; expected one of ms, cs, ds or s")]
    UnknownUnit { input: String, unit: String },

    #[error("Successfully parsed the time unit '{unit}', but could not parse the numerical component of '{input}'")]
    GotTimeUnitButCantParse { input: String, unit: &'static str },
}
