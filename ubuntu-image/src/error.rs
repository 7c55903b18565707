use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning command-line input into an [`ImageConfig`].
///
/// Every variant is a user-input error: it names the offending flag or value
/// and is reported verbatim before the process exits.
///
/// [`ImageConfig`]: crate::ImageConfig
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("argument to --image-size {value:?} is not in the correct format: {reason}")]
    InvalidSizeFormat { value: String, reason: String },

    #[error("volume {volume:?} given in --image-size is not defined in the gadget specification")]
    UnknownVolumeName { volume: String },

    #[error("invalid --sector-size {value:?}: only 512 and 4096 are supported")]
    InvalidSectorSize { value: String },

    #[error("invalid --{flag} step {step:?}: expected one of {}", .known.join(", "))]
    InvalidStepName {
        flag: &'static str,
        step: String,
        known: Vec<String>,
    },

    #[error("--until {until:?} and --thru {thru:?} cannot be used together")]
    ConflictingStepRange { until: String, thru: String },

    #[error("--resume given but no previous state was found in {}", describe_work_dir(.work_dir))]
    ResumeWithoutState { work_dir: Option<PathBuf> },

    #[error("--{flag} {step:?} leaves no step to run: {completed} steps are already done")]
    StepAlreadyCompleted {
        flag: &'static str,
        step: String,
        completed: usize,
    },

    #[error("--{flag} must not be empty")]
    EmptyPath { flag: &'static str },

    #[error("invalid --{flag} {value:?}: {reason}")]
    InvalidSnapOption {
        flag: &'static str,
        value: String,
        reason: String,
    },

    #[error("no build mode selected: use either the `snap` or the `classic` command")]
    NoCommandSelected,

    #[error("both `snap` and `classic` commands were selected")]
    AmbiguousCommand,
}

fn describe_work_dir(work_dir: &Option<PathBuf>) -> String {
    match work_dir {
        Some(dir) => dir.display().to_string(),
        None => "a temporary directory (use --workdir)".to_string(),
    }
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
