//! Options that steer the state machine: work directory, resume and the
//! `--until`/`--thru` step range.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cli::StateMachineOpts;
use crate::error::{ConfigError, Result};
use crate::steps::{resolve_step, Step};

/// Name of the file, inside the work directory, where the state machine
/// records its progress.
pub const STATE_FILE: &str = "ubuntu-image.yaml";

/// Progress recorded by a previous, interrupted run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SavedState {
    pub steps_completed: usize,
}

impl SavedState {
    pub fn write(&self, work_dir: &Path) -> Result<(), anyhow::Error> {
        let path = work_dir.join(STATE_FILE);
        let contents = serde_yml::to_string(self)?;
        fs::write(&path, contents)
            .with_context(|| format!("failed to write state to {path:?}"))?;

        Ok(())
    }
}

/// Lookup of the state persisted by a previous run.
pub trait StateStore {
    fn saved_state(&self, work_dir: &Path) -> Option<SavedState>;
}

/// Reads [`STATE_FILE`] from the work directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStateStore;

impl FileStateStore {
    fn read(path: &Path) -> Result<SavedState, anyhow::Error> {
        let file = File::open(path)?;
        let state = serde_yml::from_reader(file)?;
        Ok(state)
    }
}

impl StateStore for FileStateStore {
    fn saved_state(&self, work_dir: &Path) -> Option<SavedState> {
        let path = work_dir.join(STATE_FILE);
        if !path.is_file() {
            return None;
        }

        match Self::read(&path) {
            Ok(state) => Some(state),
            Err(err) => {
                warn!("ignoring unreadable state file {path:?}: {err:#}");
                None
            }
        }
    }
}

/// Which steps to run. At most one bound is ever set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepRange {
    until: Option<Step>,
    thru: Option<Step>,
}

impl StepRange {
    pub fn until(&self) -> Option<&Step> {
        self.until.as_ref()
    }

    pub fn thru(&self) -> Option<&Step> {
        self.thru.as_ref()
    }

    /// Exclusive index of the last step to run, out of `total` steps.
    pub fn end(&self, total: usize) -> usize {
        match (&self.until, &self.thru) {
            (Some(until), _) => until.index.min(total),
            (None, Some(thru)) => (thru.index + 1).min(total),
            (None, None) => total,
        }
    }

    pub fn includes(&self, index: usize) -> bool {
        index < self.end(usize::MAX)
    }

    fn bound(&self) -> Option<(&'static str, &Step)> {
        self.until
            .as_ref()
            .map(|step| ("until", step))
            .or_else(|| self.thru.as_ref().map(|step| ("thru", step)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachineConfig {
    pub work_dir: Option<PathBuf>,
    pub resume: bool,
    pub step_range: StepRange,
    /// Steps already done by the run being resumed; 0 for a fresh run.
    pub steps_completed: usize,
}

/// A check run once the config has been assembled, in list order.
type Rule = fn(&StateMachineConfig, Option<&SavedState>) -> Result<()>;

const RULES: &[Rule] = &[resume_requires_state, resume_bound_not_completed];

impl StateMachineConfig {
    /// Builds the config from raw options. `steps` is the canonical sequence
    /// of the selected build mode.
    pub fn build(
        opts: &StateMachineOpts,
        steps: &[String],
        store: &dyn StateStore,
    ) -> Result<Self> {
        let until = opts.until.as_deref().filter(|step| !step.is_empty());
        let thru = opts.thru.as_deref().filter(|step| !step.is_empty());

        let step_range = match (until, thru) {
            (Some(until), Some(thru)) => {
                return Err(ConfigError::ConflictingStepRange {
                    until: until.to_string(),
                    thru: thru.to_string(),
                });
            }
            (Some(until), None) => StepRange {
                until: Some(resolve_step("until", until, steps)?),
                thru: None,
            },
            (None, Some(thru)) => StepRange {
                until: None,
                thru: Some(resolve_step("thru", thru, steps)?),
            },
            (None, None) => StepRange::default(),
        };

        let work_dir = opts
            .workdir
            .as_deref()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);
        let saved = match (&work_dir, opts.resume) {
            (Some(work_dir), true) => store.saved_state(work_dir),
            _ => None,
        };

        let config = Self {
            work_dir,
            resume: opts.resume,
            step_range,
            steps_completed: saved.as_ref().map_or(0, |saved| saved.steps_completed),
        };
        for rule in RULES {
            rule(&config, saved.as_ref())?;
        }

        debug!(?config, "state machine options validated");
        Ok(config)
    }

    /// Whether the executor owns the work directory and must delete it when
    /// done: true only for a temporary directory it allocates itself.
    pub fn cleanup_work_dir(&self) -> bool {
        self.work_dir.is_none()
    }

    /// Whether the step at `index` still has to run in this invocation.
    pub fn runs_step(&self, index: usize) -> bool {
        index >= self.steps_completed && self.step_range.includes(index)
    }
}

fn resume_requires_state(config: &StateMachineConfig, saved: Option<&SavedState>) -> Result<()> {
    if config.resume && saved.is_none() {
        return Err(ConfigError::ResumeWithoutState {
            work_dir: config.work_dir.clone(),
        });
    }
    Ok(())
}

fn resume_bound_not_completed(
    config: &StateMachineConfig,
    saved: Option<&SavedState>,
) -> Result<()> {
    let (Some(saved), Some((flag, step))) = (saved, config.step_range.bound()) else {
        return Ok(());
    };
    // The bound must leave at least one step past those already completed.
    if config.resume && config.step_range.end(usize::MAX) <= saved.steps_completed {
        return Err(ConfigError::StepAlreadyCompleted {
            flag,
            step: step.name.clone(),
            completed: saved.steps_completed,
        });
    }
    Ok(())
}
