//! Build steps and the lookup of `--until`/`--thru` step names.

use std::fmt;

use crate::command::CommandKind;
use crate::error::{ConfigError, Result};

pub const SNAP_STEPS: &[&str] = &[
    "make_temporary_directories",
    "prepare_image",
    "load_gadget_yaml",
    "set_artifact_names",
    "populate_rootfs_contents",
    "generate_disk_info",
    "calculate_rootfs_size",
    "populate_bootfs_contents",
    "populate_prepare_partitions",
    "make_disk",
    "generate_snap_manifest",
    "finish",
];

pub const CLASSIC_STEPS: &[&str] = &[
    "make_temporary_directories",
    "parse_image_definition",
    "calculate_states",
    "build_gadget_tree",
    "prepare_gadget_tree",
    "load_gadget_yaml",
    "verify_artifact_names",
    "germinate",
    "create_chroot",
    "install_packages",
    "prepare_image",
    "preseed_image",
    "populate_rootfs_contents",
    "customize_cloud_init",
    "customize_fstab",
    "generate_disk_info",
    "calculate_rootfs_size",
    "populate_bootfs_contents",
    "populate_prepare_partitions",
    "make_disk",
    "generate_package_manifest",
    "finish",
];

/// Source of the canonical, ordered step names for a build mode.
pub trait StepSequence {
    fn steps(&self, kind: CommandKind) -> Vec<String>;
}

/// The steps run by the ubuntu-image state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSteps;

impl StepSequence for DefaultSteps {
    fn steps(&self, kind: CommandKind) -> Vec<String> {
        let steps = match kind {
            CommandKind::Snap => SNAP_STEPS,
            CommandKind::Classic => CLASSIC_STEPS,
        };
        steps.iter().map(|step| step.to_string()).collect()
    }
}

/// A step resolved against a sequence: its name and position in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    pub name: String,
    pub index: usize,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Looks up `name` in `steps`. Matching is exact and case-sensitive.
pub fn resolve_step(flag: &'static str, name: &str, steps: &[String]) -> Result<Step> {
    steps
        .iter()
        .position(|step| step == name)
        .map(|index| Step {
            name: name.to_string(),
            index,
        })
        .ok_or_else(|| ConfigError::InvalidStepName {
            flag,
            step: name.to_string(),
            known: steps.to_vec(),
        })
}
