// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reshape a raw voltage capture and dump the result.


use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use super::common::{ARG_FILE_HELP, TELESCOPES_COMMA_SEPARATED};
use crate::{
    constants::{DEFAULT_INTEGRATION_STEPS, DEFAULT_TIMESTEPS_PER_READ},
    io::parse_dat_file_info,
    obs_info::{ObservationInfo, Telescope},
    unit_parsing::parse_timespec,
    voltages::{ReshapeOptions, Voltages},
    AstroIoError,
};

lazy_static::lazy_static! {
    static ref TELESCOPE_HELP: String =
        format!("The telescope that recorded the capture. Supported telescopes: {}. Default: mwa1", *TELESCOPES_COMMA_SEPARATED);

    static ref INTEGRATION_STEPS_HELP: String =
        format!("The number of timesteps in each integration interval. Default: {DEFAULT_INTEGRATION_STEPS}");

    static ref TIMESTEPS_PER_READ_HELP: String =
        format!("The number of timesteps read from the capture at once. Default: {DEFAULT_TIMESTEPS_PER_READ}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ReshapeArgs {
    #[clap(long, help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// The raw capture: an MWA VCS .dat file (named
    /// <obsid>_<gpstime>_ch<NN>.dat) or an EDA2 voltage dump.
    #[clap(name = "RAW_FILE", parse(from_os_str))]
    pub(super) input: Option<PathBuf>,

    /// Where to write the reshaped voltages. The file holds pairs of signed
    /// bytes (real, imaginary) ordered [interval][channel][antenna][pol][step].
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: Option<PathBuf>,

    #[clap(short = 'n', long, help = INTEGRATION_STEPS_HELP.as_str())]
    pub(super) integration_steps: Option<u32>,

    #[clap(short, long, help = TELESCOPE_HELP.as_str())]
    pub(super) telescope: Option<String>,

    /// The time resolution of the capture, e.g. 100ms or 0.0001s. The
    /// telescope's default is used if this isn't given.
    #[clap(long)]
    pub(super) time_resolution: Option<String>,

    /// The number of timesteps in the capture. The telescope's default is
    /// used if this isn't given.
    #[clap(long)]
    pub(super) timesteps: Option<u32>,

    #[clap(long, help = TIMESTEPS_PER_READ_HELP.as_str())]
    pub(super) timesteps_per_read: Option<usize>,

    /// The number of channels at each edge of the band to set to zero.
    #[clap(long)]
    pub(super) edge: Option<u32>,

    /// Decode all timesteps in parallel (on a GPU if astroio was compiled
    /// with GPU support and one is available).
    #[clap(long)]
    #[serde(default)]
    pub(super) parallel: bool,

    /// Put the reshaped voltages in pinned host memory. Requires GPU support.
    #[clap(long)]
    #[serde(default)]
    pub(super) pinned: bool,
}

/// Everything needed to reshape a capture.
#[derive(Debug)]
pub(super) struct ReshapeParams {
    pub(super) input: PathBuf,
    pub(super) output: PathBuf,
    pub(super) obs: ObservationInfo,
    pub(super) integration_steps: u32,
    pub(super) options: ReshapeOptions,
    pub(super) parallel: bool,
}

impl ReshapeArgs {
    /// Consolidate the command-line arguments with those in the argument file
    /// (if any), preferring the command line.
    pub(super) fn merge(self) -> Result<ReshapeArgs, AstroIoError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Ensure all of the file args are accounted for by pattern
            // matching.
            let ReshapeArgs {
                args_file: _,
                input,
                output,
                integration_steps,
                telescope,
                time_resolution,
                timesteps,
                timesteps_per_read,
                edge,
                parallel,
                pinned,
            } = unpack_arg_file!(arg_file);

            Ok(ReshapeArgs {
                args_file: None,
                input: cli_args.input.or(input),
                output: cli_args.output.or(output),
                integration_steps: cli_args.integration_steps.or(integration_steps),
                telescope: cli_args.telescope.or(telescope),
                time_resolution: cli_args.time_resolution.or(time_resolution),
                timesteps: cli_args.timesteps.or(timesteps),
                timesteps_per_read: cli_args.timesteps_per_read.or(timesteps_per_read),
                edge: cli_args.edge.or(edge),
                parallel: cli_args.parallel || parallel,
                pinned: cli_args.pinned || pinned,
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<ReshapeParams, AstroIoError> {
        debug!("{:#?}", self);

        let ReshapeArgs {
            args_file: _,
            input,
            output,
            integration_steps,
            telescope,
            time_resolution,
            timesteps,
            timesteps_per_read,
            edge,
            parallel,
            pinned,
        } = self;

        let input = input.ok_or(ReshapeArgsError::NoInput)?;
        let output = output.ok_or(ReshapeArgsError::NoOutput)?;
        let telescope = match telescope {
            Some(t) => Telescope::from_str(&t).map_err(|_| ReshapeArgsError::BadTelescope(t))?,
            None => Telescope::default(),
        };

        let mut obs = match telescope {
            Telescope::Eda2 => ObservationInfo::eda2(),
            t => match parse_dat_file_info(&input) {
                Ok(obs) => ObservationInfo {
                    telescope: t,
                    ..obs
                },
                Err(e) => {
                    warn!("{e}; using the {t} defaults for the observation");
                    ObservationInfo::for_telescope(t)
                }
            },
        };
        if let Some(time_resolution) = time_resolution {
            obs.time_resolution = parse_timespec(&time_resolution)?;
        }
        if let Some(timesteps) = timesteps {
            obs.n_timesteps = timesteps;
        }
        obs.validate()?;

        let integration_steps = integration_steps.unwrap_or(DEFAULT_INTEGRATION_STEPS);
        if integration_steps == 0 {
            return Err(ReshapeArgsError::ZeroIntegrationSteps.into());
        }
        if parallel && telescope == Telescope::Eda2 {
            warn!("EDA2 voltages are not packed; ignoring --parallel");
        }

        Ok(ReshapeParams {
            input,
            output,
            obs,
            integration_steps,
            options: ReshapeOptions {
                timesteps_per_read: timesteps_per_read.unwrap_or(DEFAULT_TIMESTEPS_PER_READ),
                edge: edge.unwrap_or(0),
                pinned,
            },
            parallel: parallel && telescope != Telescope::Eda2,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), AstroIoError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        info!("Input:  {}", params.input.display());
        info!("Output: {}", params.output.display());
        info!(
            "{} antennas, {} channels, {} timesteps of {}s, {} integration steps",
            params.obs.n_antennas,
            params.obs.n_frequencies,
            params.obs.n_timesteps,
            params.obs.time_resolution,
            params.integration_steps
        );

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()
    }
}

impl ReshapeParams {
    pub(super) fn run(self) -> Result<(), AstroIoError> {
        let ReshapeParams {
            input,
            output,
            obs,
            integration_steps,
            options,
            parallel,
        } = self;

        let voltages = if obs.telescope == Telescope::Eda2 {
            Voltages::from_eda2_file(&input, &obs, integration_steps, options.pinned)?
        } else if parallel {
            Voltages::from_dat_file_parallel(&input, &obs, integration_steps, options)?
        } else {
            Voltages::from_dat_file(&input, &obs, integration_steps, options)?
        };
        info!(
            "Reshaped {} samples into {} integration intervals ({} memory)",
            voltages.size(),
            voltages.integration_intervals(),
            voltages.buffer().kind()
        );

        voltages.buffer().dump(&output)?;
        info!("Wrote {}", output.display());
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum ReshapeArgsError {
    #[error("No raw voltage file was specified")]
    NoInput,

    #[error("No output file was specified")]
    NoOutput,

    #[error("Unknown telescope '{0}'; supported telescopes are: {}", *TELESCOPES_COMMA_SEPARATED)]
    BadTelescope(String),

    #[error("The number of integration steps must be positive")]
    ZeroIntegrationSteps,
}

impl From<ReshapeArgsError> for AstroIoError {
    fn from(e: ReshapeArgsError) -> Self {
        Self::Configuration(e.to_string())
    }
}
