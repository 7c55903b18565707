//! Parsing of the `--image-size` argument.
//!
//! Two forms are accepted:
//!
//! * a single size, e.g. `4G`, applied to every volume of the gadget;
//! * the extended multi-volume syntax, e.g. `pc:4G,seed:512M` or `0:4G,1:512M`,
//!   where a volume is addressed by name or by its position in `gadget.yaml`.
//!
//! A size is a decimal number of bytes, optionally suffixed by `M` (MiB) or
//! `G` (GiB), case-insensitively.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use foyer_bytesize::ByteSize;

use crate::error::{ConfigError, Result};
use crate::gadget::GadgetVolumes;

const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;

/// Which volume a size applies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VolumeKey {
    /// Unkeyed size: applies to every volume.
    Default,
    /// Volume addressed by its position in the gadget specification.
    Index(usize),
    /// Volume addressed by name.
    Name(String),
}

impl fmt::Display for VolumeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeKey::Default => f.write_str("<default>"),
            VolumeKey::Index(index) => write!(f, "{index}"),
            VolumeKey::Name(name) => f.write_str(name),
        }
    }
}

/// One requested image size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeSpec {
    pub volume: VolumeKey,
    pub size: ByteSize,
}

impl SizeSpec {
    pub fn bytes(&self) -> u64 {
        self.size.as_u64()
    }
}

/// The parsed `--image-size` argument, in the order it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSizes {
    specs: Vec<SizeSpec>,
}

impl ImageSizes {
    /// Parses a raw `--image-size` value.
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.contains(':') && !raw.contains(',') {
            let size = parse_size(raw, raw)?;
            return Ok(Self {
                specs: vec![SizeSpec {
                    volume: VolumeKey::Default,
                    size,
                }],
            });
        }

        let mut specs: Vec<SizeSpec> = Vec::new();
        for entry in raw.split(',') {
            let (volume, size) = entry
                .split_once(':')
                .ok_or_else(|| invalid(raw, format!("{entry:?} is not of the form VOLUME:SIZE")))?;
            let volume = parse_volume_key(volume, raw)?;
            if specs.iter().any(|spec| spec.volume == volume) {
                return Err(invalid(raw, format!("volume {volume} is given more than once")));
            }
            let size = parse_size(size, raw)?;
            specs.push(SizeSpec { volume, size });
        }

        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[SizeSpec] {
        &self.specs
    }

    /// The unkeyed size, if the single-size form was used.
    pub fn default_size(&self) -> Option<ByteSize> {
        self.get(&VolumeKey::Default)
    }

    pub fn get(&self, volume: &VolumeKey) -> Option<ByteSize> {
        self.specs
            .iter()
            .find(|spec| &spec.volume == volume)
            .map(|spec| spec.size)
    }

    /// Maps every requested size onto a named volume of the gadget.
    ///
    /// Called once the gadget specification has been loaded. Sizes smaller
    /// than what the volume needs are kept as-is; the executor decides how to
    /// reconcile them.
    pub fn resolve(&self, gadget: &dyn GadgetVolumes) -> Result<BTreeMap<String, ByteSize>> {
        let volumes = gadget.volume_names();
        let mut resolved = BTreeMap::new();

        for spec in &self.specs {
            let names: Vec<&String> = match &spec.volume {
                VolumeKey::Default => volumes.iter().collect(),
                VolumeKey::Index(index) => {
                    let name = volumes.get(*index).ok_or_else(|| ConfigError::UnknownVolumeName {
                        volume: index.to_string(),
                    })?;
                    vec![name]
                }
                VolumeKey::Name(name) => {
                    let name = volumes.iter().find(|volume| *volume == name).ok_or_else(|| {
                        ConfigError::UnknownVolumeName {
                            volume: name.clone(),
                        }
                    })?;
                    vec![name]
                }
            };

            for name in names {
                if resolved.insert(name.clone(), spec.size).is_some() {
                    return Err(ConfigError::InvalidSizeFormat {
                        value: self.to_string(),
                        reason: format!("volume {name:?} is given more than once"),
                    });
                }
            }
        }

        Ok(resolved)
    }
}

impl FromStr for ImageSizes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, spec) in self.specs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match spec.volume {
                VolumeKey::Default => write!(f, "{}", spec.bytes())?,
                _ => write!(f, "{}:{}", spec.volume, spec.bytes())?,
            }
        }
        Ok(())
    }
}

fn parse_volume_key(volume: &str, raw: &str) -> Result<VolumeKey> {
    if volume.is_empty() {
        return Err(invalid(raw, "volume name must not be empty"));
    }
    if volume.bytes().all(|b| b.is_ascii_digit()) {
        let index = volume
            .parse()
            .map_err(|_| invalid(raw, format!("volume index {volume} is too large")))?;
        return Ok(VolumeKey::Index(index));
    }
    Ok(VolumeKey::Name(volume.to_string()))
}

fn parse_size(token: &str, raw: &str) -> Result<ByteSize> {
    let (digits, unit) = match token.as_bytes().last() {
        Some(b'M' | b'm') => (&token[..token.len() - 1], MIB),
        Some(b'G' | b'g') => (&token[..token.len() - 1], GIB),
        _ => (token, 1),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(
            raw,
            format!("{token:?} must be a number of bytes, optionally followed by M or G"),
        ));
    }

    let value: u64 = digits
        .parse()
        .map_err(|_| invalid(raw, format!("{token:?} is too large")))?;
    if value == 0 {
        return Err(invalid(raw, "size must be greater than zero"));
    }

    value
        .checked_mul(unit)
        .map(ByteSize::b)
        .ok_or_else(|| invalid(raw, format!("{token:?} is too large")))
}

fn invalid(raw: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidSizeFormat {
        value: raw.to_string(),
        reason: reason.into(),
    }
}
