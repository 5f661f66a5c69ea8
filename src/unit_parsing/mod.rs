// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to parse human-readable durations (e.g. "10ms") into seconds.

mod error;

pub use error::UnitParseError;

use std::str::FromStr;

use strum_macros::{EnumIter, EnumString, IntoStaticStr};

/// Units accepted at the end of a time specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum TimeSpecUnit {
    /// Milliseconds
    Ms,

    /// Centiseconds
    Cs,

    /// Deciseconds
    Ds,

    /// Seconds
    S,
}

impl TimeSpecUnit {
    /// How many of this unit make up one second.
    pub fn per_second(self) -> f64 {
        match self {
            TimeSpecUnit::Ms => 1000.0,
            TimeSpecUnit::Cs => 100.0,
            TimeSpecUnit::Ds => 10.0,
            TimeSpecUnit::S => 1.0,
        }
    }
}

/// Parse a time specification like "0.4s", "2ds" or "10ms" into seconds. The
/// unit is mandatory and the number may contain at most one decimal point.
pub fn parse_timespec(spec: &str) -> Result<f64, UnitParseError> {
    if spec.is_empty() {
        return Err(UnitParseError::Empty);
    }

    let number_end = spec
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(spec.len());
    let (number, unit) = spec.split_at(number_end);
    if number.matches('.').count() > 1 {
        return Err(UnitParseError::TooManyDots(spec.to_string()));
    }
    if unit.is_empty() {
        return Err(UnitParseError::MissingUnit(spec.to_string()));
    }
    let unit = TimeSpecUnit::from_str(unit).map_err(|_| UnitParseError::UnknownUnit {
        input: spec.to_string(),
        unit: unit.to_string(),
    })?;
    let number: f64 = number
        .parse()
        .map_err(|_| UnitParseError::GotTimeUnitButCantParse {
            input: spec.to_string(),
            unit: unit.into(),
        })?;

    Ok(number / unit.per_second())
}
