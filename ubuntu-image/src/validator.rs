use tracing::debug;

use crate::cli::Cli;
use crate::command::BuildCommand;
use crate::common::CommonConfig;
use crate::error::Result;
use crate::state_machine::{FileStateStore, StateMachineConfig, StateStore};
use crate::steps::{DefaultSteps, StepSequence};
use crate::ImageConfig;

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validated {
    /// `--version` was given: print the version and do nothing else.
    Version,
    Build(ImageConfig),
}

/// Turns parsed command-line options into an [`ImageConfig`].
///
/// Checks run in a fixed order and the first failure is returned:
///
/// 1. `--version` short-circuits everything else;
/// 2. exactly one build mode must be selected;
/// 3. common options;
/// 4. state machine options, against the steps of the selected mode.
pub struct ConfigValidator<'a> {
    steps: &'a dyn StepSequence,
    state: &'a dyn StateStore,
}

impl Default for ConfigValidator<'static> {
    fn default() -> Self {
        Self {
            steps: &DefaultSteps,
            state: &FileStateStore,
        }
    }
}

impl<'a> ConfigValidator<'a> {
    pub fn new(steps: &'a dyn StepSequence, state: &'a dyn StateStore) -> Self {
        Self { steps, state }
    }

    pub fn validate(&self, cli: &Cli) -> Result<Validated> {
        if cli.common.version {
            debug!("version requested, skipping validation");
            return Ok(Validated::Version);
        }

        let (snap, classic) = cli.command_markers();
        let command = BuildCommand::select(snap, classic)?;
        let common = CommonConfig::build(&cli.common)?;
        let steps = self.steps.steps(command.kind());
        let state_machine = StateMachineConfig::build(&cli.state_machine, &steps, self.state)?;

        debug!(mode = %command.kind(), "configuration validated");
        Ok(Validated::Build(ImageConfig {
            common,
            state_machine,
            command,
        }))
    }
}
