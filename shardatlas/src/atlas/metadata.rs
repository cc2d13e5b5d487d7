//! Descriptive information carried by every atlas.

use serde::{Deserialize, Serialize};

use super::Tags;

/// Atlas metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasMetaData {
    /// `true` for an atlas built directly from source data, `false` for a
    /// derived view such as a merge of shards.
    pub original: bool,
    /// Version of the code that produced the atlas.
    pub code_version: String,
    /// Version of the source data.
    pub data_version: String,
    /// Name of the shard this atlas holds, if it is a single shard.
    #[serde(default)]
    pub shard: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Tags,
}

impl Default for AtlasMetaData {
    fn default() -> Self {
        Self {
            original: true,
            code_version: crate::VERSION.to_string(),
            data_version: "unknown".to_string(),
            shard: None,
            tags: Tags::new(),
        }
    }
}

impl AtlasMetaData {
    /// Metadata for the single-shard atlas `shard`.
    pub fn for_shard(shard: impl Into<String>) -> Self {
        Self {
            shard: Some(shard.into()),
            ..Self::default()
        }
    }

    pub fn with_data_version(mut self, data_version: impl Into<String>) -> Self {
        self.data_version = data_version.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}
