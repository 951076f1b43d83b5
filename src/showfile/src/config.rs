use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShowFileError};
use crate::format::block::BlockType;
use crate::format::registry::{BlockTypeRegistry, BlockTypeRegistryBuilder};
use crate::format::{is_supported_version, Features, DEFAULT_VERSION, VERSION_2};

/// ShowFileOptions controls how show files are written and how block codes
/// are interpreted when reading them.
#[derive(Debug, Clone)]
pub struct ShowFileOptions {
    pub version: u8,
    pub features: Features,
    pub registry: Arc<BlockTypeRegistry>,
}

impl ShowFileOptions {
    /// for_version returns the default options for a file of the given version.
    pub fn for_version(version: u8) -> Self {
        Self {
            version,
            features: Features::default_for_version(version),
            registry: BlockTypeRegistry::shared(),
        }
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }
}

impl Default for ShowFileOptions {
    fn default() -> Self {
        Self::for_version(DEFAULT_VERSION)
    }
}

/// ShowFileConfig is the JSON form of ShowFileOptions, e.g.
///
/// ```json
/// { "version": 2, "checksum": true, "blockTypes": { "rthPlan": 4 } }
/// ```
///
/// Block types not listed keep their default codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShowFileConfig {
    #[serde(default)]
    pub version: Option<u8>,
    #[serde(default)]
    pub checksum: Option<bool>,
    #[serde(default)]
    pub block_types: BTreeMap<String, u8>,
}

impl ShowFileConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| ShowFileError::Config(e.to_string()))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = tokio::fs::read_to_string(path).await?;
        Self::from_json(&data)
    }

    pub fn registry(&self) -> Result<Arc<BlockTypeRegistry>> {
        if self.block_types.is_empty() {
            return Ok(BlockTypeRegistry::shared());
        }

        let mut builder = BlockTypeRegistryBuilder::with_defaults();
        for (name, code) in &self.block_types {
            let typ = BlockType::from_name(name)
                .ok_or_else(|| ShowFileError::Config(format!("unknown block type: {}", name)))?;
            builder = builder.register(typ, *code)?;
        }
        Ok(Arc::new(builder.build()))
    }

    pub fn into_options(self) -> Result<ShowFileOptions> {
        let version = self.version.unwrap_or(DEFAULT_VERSION);
        if !is_supported_version(version) {
            return Err(ShowFileError::Config(format!(
                "unsupported version: {}",
                version
            )));
        }

        let features = match self.checksum {
            Some(true) if version < VERSION_2 => {
                return Err(ShowFileError::Config(format!(
                    "version {} files cannot carry a checksum",
                    version
                )))
            }
            Some(true) => Features::CRC32,
            Some(false) => Features::empty(),
            None => Features::default_for_version(version),
        };

        Ok(ShowFileOptions {
            version,
            features,
            registry: self.registry()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ShowFileConfig, ShowFileOptions};
    use crate::error::ShowFileError;
    use crate::format::block::BlockType;
    use crate::format::Features;

    #[test]
    fn test_default_options() {
        let o = ShowFileOptions::default();
        assert_eq!(o.version, 2);
        assert_eq!(o.features, Features::CRC32);

        let o = ShowFileOptions::for_version(1);
        assert!(o.features.is_empty());
    }

    #[test]
    fn test_empty_config() {
        let o = ShowFileConfig::from_json("{}").unwrap().into_options().unwrap();
        assert_eq!(o.version, 2);
        assert_eq!(o.features, Features::CRC32);
        assert_eq!(o.registry.code_of(BlockType::RthPlan).unwrap(), 4);
    }

    #[test]
    fn test_config_overrides() {
        let c = ShowFileConfig::from_json(
            r#"{"version": 2, "checksum": false, "blockTypes": {"rthPlan": 40}}"#,
        )
        .unwrap();
        let o = c.into_options().unwrap();
        assert!(o.features.is_empty());
        assert_eq!(o.registry.code_of(BlockType::RthPlan).unwrap(), 40);
        assert_eq!(o.registry.code_of(BlockType::Comment).unwrap(), 3);
    }

    #[test]
    fn test_invalid_configs() {
        for json in [
            r#"{"version": 3}"#,
            r#"{"version": 1, "checksum": true}"#,
            r#"{"blockTypes": {"nope": 1}}"#,
            r#"{"colour": "red"}"#,
            r#"not json"#,
        ] {
            let err = ShowFileConfig::from_json(json)
                .and_then(|c| c.into_options())
                .unwrap_err();
            assert!(matches!(err, ShowFileError::Config(_)), "{}: {}", json, err);
        }

        let err = ShowFileConfig::from_json(r#"{"blockTypes": {"rthPlan": 3}}"#)
            .and_then(|c| c.into_options())
            .unwrap_err();
        assert!(matches!(err, ShowFileError::DuplicateBlockType(_)));
    }

    #[tokio::test]
    async fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.as_ref().join("skyb.json");
        tokio::fs::write(&path, r#"{"version": 1}"#).await.unwrap();

        let c = ShowFileConfig::load(&path).await.unwrap();
        assert_eq!(c.version, Some(1));
        assert!(c.into_options().unwrap().features.is_empty());
    }
}
