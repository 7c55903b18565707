use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use foyer_bytesize::ByteSize;
use tracing::debug;

use crate::cli::CommonOpts;
use crate::error::{ConfigError, Result};
use crate::gadget::GadgetVolumes;
use crate::size::ImageSizes;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SectorSize {
    #[default]
    S512,
    S4096,
}

impl SectorSize {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "512" => Ok(SectorSize::S512),
            "4096" => Ok(SectorSize::S4096),
            _ => Err(ConfigError::InvalidSectorSize {
                value: raw.to_string(),
            }),
        }
    }

    pub fn bytes(self) -> u64 {
        match self {
            SectorSize::S512 => 512,
            SectorSize::S4096 => 4096,
        }
    }
}

impl fmt::Display for SectorSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

/// Build options shared by the snap and classic modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonConfig {
    pub debug: bool,
    pub version: bool,
    pub image_size: Option<ImageSizes>,
    pub image_file_list: Option<PathBuf>,
    pub cloud_init: Option<PathBuf>,
    pub hooks_directories: Vec<PathBuf>,
    pub disk_info: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub channel: Option<String>,
    pub sector_size: SectorSize,
}

impl CommonConfig {
    /// Validates the raw options. Existence of the referenced files and
    /// directories is left to the step that first uses them.
    pub fn build(opts: &CommonOpts) -> Result<Self> {
        let sector_size = SectorSize::parse(&opts.sector_size)?;
        let image_size = opts.image_size.as_deref().map(ImageSizes::parse).transpose()?;

        let hooks_directories = opts
            .hooks_directories
            .iter()
            .map(|dir| non_empty_path("hooks-directory", dir))
            .collect::<Result<Vec<_>>>()?;

        let config = Self {
            debug: opts.debug,
            version: opts.version,
            image_size,
            image_file_list: optional_path("image-file-list", &opts.image_file_list)?,
            cloud_init: optional_path("cloud-init", &opts.cloud_init)?,
            hooks_directories,
            disk_info: optional_path("disk-info", &opts.disk_info)?,
            output_dir: optional_path("output-dir", &opts.output_dir)?,
            channel: opts.channel.clone().filter(|channel| !channel.is_empty()),
            sector_size,
        };

        debug!(?config, "common options validated");
        Ok(config)
    }

    /// Maps `--image-size` onto the volumes of the loaded gadget.
    ///
    /// Returns an empty map when no size was requested.
    pub fn resolve_image_sizes(
        &self,
        gadget: &dyn GadgetVolumes,
    ) -> Result<BTreeMap<String, ByteSize>> {
        match &self.image_size {
            Some(sizes) => sizes.resolve(gadget),
            None => Ok(BTreeMap::new()),
        }
    }
}

fn non_empty_path(flag: &'static str, raw: &str) -> Result<PathBuf> {
    if raw.is_empty() {
        return Err(ConfigError::EmptyPath { flag });
    }
    Ok(PathBuf::from(raw))
}

fn optional_path(flag: &'static str, raw: &Option<String>) -> Result<Option<PathBuf>> {
    raw.as_deref().map(|raw| non_empty_path(flag, raw)).transpose()
}
