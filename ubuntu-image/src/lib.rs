//! Configuration front-end of ubuntu-image.
//!
//! Turns the command line into a validated [`ImageConfig`] that the image
//! build state machine consumes.

pub mod cli;
pub mod command;
pub mod common;
pub mod error;
pub mod gadget;
pub mod size;
pub mod state_machine;
pub mod steps;
pub mod validator;

pub use cli::Cli;
pub use command::{BuildCommand, ClassicCommand, CommandKind, SnapCommand};
pub use common::{CommonConfig, SectorSize};
pub use error::ConfigError;
pub use gadget::{GadgetVolumes, GadgetYaml};
pub use size::{ImageSizes, SizeSpec, VolumeKey};
pub use state_machine::{FileStateStore, SavedState, StateMachineConfig, StateStore, StepRange};
pub use steps::{DefaultSteps, Step, StepSequence};
pub use validator::{ConfigValidator, Validated};

/// A fully validated build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    pub common: CommonConfig,
    pub state_machine: StateMachineConfig,
    pub command: BuildCommand,
}

impl ImageConfig {
    /// Validates parsed options with the default step sequences and the
    /// on-disk state store.
    pub fn create(cli: &Cli) -> Result<Validated, ConfigError> {
        ConfigValidator::default().validate(cli)
    }

    /// Names of the steps this invocation will run, in order. Steps already
    /// completed by a resumed run are left out.
    pub fn planned_steps(&self, steps: &dyn StepSequence) -> Vec<String> {
        steps
            .steps(self.command.kind())
            .into_iter()
            .enumerate()
            .filter(|(index, _)| self.state_machine.runs_step(*index))
            .map(|(_, step)| step)
            .collect()
    }
}

pub fn version_text() -> String {
    format!("ubuntu-image {}", env!("CARGO_PKG_VERSION"))
}
