use std::{fs::File, path::Path};

use anyhow::Context;
use serde::Deserialize;
use serde_yml::Value;
use tracing::warn;

/// Volume names declared by a gadget specification, in declaration order.
///
/// The gadget is only known once a later build step has unpacked it, so the
/// lookup is consulted lazily, through [`crate::CommonConfig::resolve_image_sizes`].
pub trait GadgetVolumes {
    fn volume_names(&self) -> Vec<String>;
}

/// The `volumes:` section of a `gadget.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GadgetYaml {
    #[serde(default)]
    volumes: serde_yml::Mapping,
}

impl GadgetYaml {
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let file = File::open(path)
            .with_context(|| format!("failed to open gadget specification {path:?}"))?;
        let gadget: Self = serde_yml::from_reader(file)
            .with_context(|| format!("failed to parse gadget specification {path:?}"))?;

        Ok(gadget)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        serde_yml::from_str(contents).context("failed to parse gadget specification")
    }
}

impl GadgetVolumes for GadgetYaml {
    fn volume_names(&self) -> Vec<String> {
        self.volumes.keys().filter_map(volume_name).collect()
    }
}

/// Volume names are mapping keys; YAML reads keys such as `1` or `true` as
/// scalars of other types, which still name a volume.
fn volume_name(key: &Value) -> Option<String> {
    match key {
        Value::String(name) => Some(name.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => {
            warn!("ignoring gadget volume with non-scalar name {key:?}");
            None
        }
    }
}
