//! Extension handling configuration.
//!
//! Loaded from YAML:
//!
//! ```yaml
//! failure_policy: record   # or: abort
//! warn_on_unprefixed_names: true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What the interceptor does when a registered parser rejects a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the raw node as a failed value, record the failure, continue
    #[default]
    Record,
    /// Stop reading the document at the first failure
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    pub failure_policy: FailurePolicy,

    /// Log a warning when a registered name is not `VENDOR_feature` shaped
    pub warn_on_unprefixed_names: bool,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Record,
            warn_on_unprefixed_names: true,
        }
    }
}

impl ExtensionConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Example
    /// ```ignore
    /// use gltf_ext::ExtensionConfig;
    ///
    /// let config = ExtensionConfig::load_from_file("config/extensions.yaml")?;
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        // An empty document means "all defaults"
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}
