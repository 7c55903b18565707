//! Selection of the build mode and binding of its arguments.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::cli::{ClassicArgs, SnapArgs, SnapOpts};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Snap,
    Classic,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Snap => f.write_str("snap"),
            CommandKind::Classic => f.write_str("classic"),
        }
    }
}

/// The selected build mode with its own arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildCommand {
    Snap(SnapCommand),
    Classic(ClassicCommand),
}

impl BuildCommand {
    /// Builds the command from the sub-command markers found on the command
    /// line. Exactly one of them must be present.
    pub fn select(snap: Option<&SnapArgs>, classic: Option<&ClassicArgs>) -> Result<Self> {
        match (snap, classic) {
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousCommand),
            (None, None) => Err(ConfigError::NoCommandSelected),
            (Some(args), None) => Ok(BuildCommand::Snap(SnapCommand::from_args(args)?)),
            (None, Some(args)) => Ok(BuildCommand::Classic(ClassicCommand::from_args(args))),
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            BuildCommand::Snap(_) => CommandKind::Snap,
            BuildCommand::Classic(_) => CommandKind::Classic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    Ignore,
    Enforce,
}

/// An extra snap requested with `--snap NAME[=CHANNEL]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraSnap {
    pub name: String,
    pub channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SnapCommand {
    pub model_assertion: Option<PathBuf>,
    pub disable_console_conf: bool,
    pub factory_image: bool,
    pub snaps: Vec<ExtraSnap>,
    pub revisions: BTreeMap<String, u64>,
    pub preseed: bool,
    pub preseed_sign_key: Option<String>,
    pub sysfs_overlay: Option<PathBuf>,
    pub validation: Option<ValidationPolicy>,
}

impl SnapCommand {
    fn from_args(args: &SnapArgs) -> Result<Self> {
        let SnapOpts {
            disable_console_conf,
            factory_image,
            snaps,
            revisions,
            preseed,
            preseed_sign_key,
            sysfs_overlay,
            validation,
        } = &args.opts;

        Ok(Self {
            model_assertion: args.model_assertion.as_ref().map(PathBuf::from),
            disable_console_conf: *disable_console_conf,
            factory_image: *factory_image,
            snaps: snaps
                .iter()
                .map(|snap| parse_extra_snap(snap))
                .collect::<Result<_>>()?,
            revisions: parse_revisions(revisions)?,
            preseed: *preseed,
            preseed_sign_key: preseed_sign_key.clone(),
            sysfs_overlay: sysfs_overlay.as_ref().map(PathBuf::from),
            validation: validation.as_deref().map(parse_validation).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassicCommand {
    pub image_definition: Option<PathBuf>,
}

impl ClassicCommand {
    fn from_args(args: &ClassicArgs) -> Self {
        Self {
            image_definition: args.image_definition.as_ref().map(PathBuf::from),
        }
    }
}

fn parse_extra_snap(raw: &str) -> Result<ExtraSnap> {
    let (name, channel) = match raw.split_once('=') {
        Some((name, channel)) if !channel.is_empty() => (name, Some(channel.to_string())),
        Some(_) => {
            return Err(invalid_snap_option("snap", raw, "channel must not be empty"));
        }
        None => (raw, None),
    };
    if name.is_empty() {
        return Err(invalid_snap_option("snap", raw, "snap name must not be empty"));
    }

    Ok(ExtraSnap {
        name: name.to_string(),
        channel,
    })
}

fn parse_revisions(raw: &[String]) -> Result<BTreeMap<String, u64>> {
    let mut revisions = BTreeMap::new();
    for entry in raw {
        let (name, revision) = entry
            .split_once(':')
            .ok_or_else(|| invalid_snap_option("revision", entry, "expected SNAP:REVISION"))?;
        if name.is_empty() {
            return Err(invalid_snap_option("revision", entry, "snap name must not be empty"));
        }
        let revision = revision
            .parse::<u64>()
            .ok()
            .filter(|revision| *revision > 0)
            .ok_or_else(|| {
                invalid_snap_option("revision", entry, "revision must be a positive integer")
            })?;
        if revisions.insert(name.to_string(), revision).is_some() {
            return Err(invalid_snap_option(
                "revision",
                entry,
                "revision given more than once for this snap",
            ));
        }
    }
    Ok(revisions)
}

fn parse_validation(raw: &str) -> Result<ValidationPolicy> {
    match raw {
        "ignore" => Ok(ValidationPolicy::Ignore),
        "enforce" => Ok(ValidationPolicy::Enforce),
        _ => Err(invalid_snap_option("validation", raw, "expected \"ignore\" or \"enforce\"")),
    }
}

fn invalid_snap_option(flag: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidSnapOption {
        flag,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
