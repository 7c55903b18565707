//! Command-line option schema.
//!
//! The structs here only bind raw flag values. Every constraint on them is
//! checked by the builders in the rest of the crate so that violations are
//! reported as [`crate::ConfigError`]s in a fixed order.

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "ubuntu-image",
    about = "Generate a bootable disk image",
    disable_version_flag = true
)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonOpts,

    #[command(flatten)]
    pub state_machine: StateMachineOpts,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The sub-command markers, one slot per build mode.
    pub fn command_markers(&self) -> (Option<&SnapArgs>, Option<&ClassicArgs>) {
        match &self.command {
            Some(Commands::Snap(args)) => (Some(args), None),
            Some(Commands::Classic(args)) => (None, Some(args)),
            None => (None, None),
        }
    }
}

/// Options common to every image type.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CommonOpts {
    /// Enable debugging output
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// The suggested size of the generated disk image file. If this size is
    /// smaller than the minimum calculated size of the image a warning will be
    /// issued and --image-size will be ignored. The value is the size in
    /// bytes, with allowable suffixes "M" for MiB and "G" for GiB. Use
    /// VOLUME:SIZE[,VOLUME:SIZE...] to size the disk images of a multi-volume
    /// gadget.yaml
    #[arg(short = 'i', long, global = true, value_name = "SIZE")]
    pub image_size: Option<String>,

    /// Print to this file a list of the paths to all the disk images created
    #[arg(long, global = true, value_name = "FILENAME")]
    pub image_file_list: Option<String>,

    /// cloud-config data to be copied to the image
    #[arg(long, global = true, value_name = "USER-DATA-FILE")]
    pub cloud_init: Option<String>,

    /// Path or comma-separated list of paths of directories in which scripts
    /// for build-time hooks will be located
    #[arg(
        long = "hooks-directory",
        global = true,
        value_name = "DIRECTORY",
        value_delimiter = ','
    )]
    pub hooks_directories: Vec<String>,

    /// File to be used as .disk/info on the image's rootfs
    #[arg(long, global = true, value_name = "DISK-INFO-CONTENTS")]
    pub disk_info: Option<String>,

    /// The directory in which to put generated disk image files, named
    /// <volume>.img after the volumes of gadget.yaml
    #[arg(short = 'O', long, global = true, value_name = "DIRECTORY")]
    pub output_dir: Option<String>,

    /// Print the version number of ubuntu-image and exit
    #[arg(long, global = true)]
    pub version: bool,

    /// The default snap channel to use
    #[arg(short = 'c', long, global = true, value_name = "CHANNEL")]
    pub channel: Option<String>,

    /// Sector size to use when creating the disk image. Only 512 and 4096
    /// are supported
    #[arg(long, global = true, value_name = "SECTOR-SIZE", default_value = "512")]
    pub sector_size: String,
}

/// Options controlling the state machine run.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[command(next_help_heading = "State Machine Options")]
pub struct StateMachineOpts {
    /// The working directory in which to download and unpack all the source
    /// files for the image. It is not removed after the run. Without it a
    /// temporary directory is used and deleted afterwards. Required to resume
    /// a partial run
    #[arg(short = 'w', long, global = true, value_name = "DIRECTORY")]
    pub workdir: Option<String>,

    /// Run the state machine until the given STEP, non-inclusively
    #[arg(short = 'u', long, global = true, value_name = "STEP")]
    pub until: Option<String>,

    /// Run the state machine through the given STEP, inclusively
    #[arg(short = 't', long, global = true, value_name = "STEP")]
    pub thru: Option<String>,

    /// Continue the state machine from the previously saved state. It is an
    /// error if there is no previous state
    #[arg(short = 'r', long, global = true)]
    pub resume: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Build a snap-based Ubuntu Core image
    Snap(SnapArgs),
    /// Build a classic, deb-based image
    Classic(ClassicArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SnapArgs {
    /// Path to the model assertion file
    #[arg(value_name = "MODEL_ASSERTION")]
    pub model_assertion: Option<String>,

    #[command(flatten)]
    pub opts: SnapOpts,
}

#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct SnapOpts {
    /// Disable console-conf on the resulting image
    #[arg(long)]
    pub disable_console_conf: bool,

    /// Hint that the image is meant to boot in a device factory
    #[arg(long)]
    pub factory_image: bool,

    /// Install extra snaps, as SNAP[=CHANNEL]
    #[arg(long = "snap", value_name = "SNAP")]
    pub snaps: Vec<String>,

    /// Install a specific revision of a snap, as SNAP:REVISION
    #[arg(long = "revision", value_name = "SNAP:REVISION")]
    pub revisions: Vec<String>,

    /// Preseed the image
    #[arg(long)]
    pub preseed: bool,

    /// Name of the key used to sign the preseed assertion
    #[arg(long, value_name = "KEY")]
    pub preseed_sign_key: Option<String>,

    /// Directory containing a sysfs overlay used by preseeding
    #[arg(long, value_name = "DIRECTORY")]
    pub sysfs_overlay: Option<String>,

    /// Control whether validations are enforced or ignored
    #[arg(long, value_name = "ignore|enforce")]
    pub validation: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ClassicArgs {
    /// Path to the image definition file
    #[arg(value_name = "IMAGE_DEFINITION")]
    pub image_definition: Option<String>,
}
