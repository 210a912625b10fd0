//! Bridge configuration (`[bridge]` table of the embedder's TOML config)
//!
//! ```toml
//! [bridge]
//! variadic = "always-false"
//! warn_unsupported = true
//! cache_proxy_types = true
//!
//! [bridge.access]
//! global = "ALL"
//!
//! [bridge.access.types]
//! "com.example.Secret" = "PUBLIC_ONLY"
//! "plugins.*" = "METHODS|CONSTRUCTORS"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::access::{AccessPermission, AccessPolicy, TypePermissionRule};
use crate::error::ConfigError;

/// How the bridge reports variadic host members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariadicPolicy {
    /// Report every member as non-variadic
    #[default]
    AlwaysFalse,
    /// Report what the host declares
    Declared,
}

/// Access policy section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Global default permissions
    #[serde(default = "default_global")]
    pub global: String,

    /// Per-type permissions; keys containing `*` become wildcard rules
    #[serde(default)]
    pub types: BTreeMap<String, String>,
}

fn default_global() -> String {
    "ALL".to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            global: default_global(),
            types: BTreeMap::new(),
        }
    }
}

/// Bridge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Variadic reporting
    #[serde(default)]
    pub variadic: VariadicPolicy,

    /// Emit a warning when a proxied method has no script implementation
    #[serde(default = "default_true")]
    pub warn_unsupported: bool,

    /// Reuse synthesized proxy types for identical interface sets
    #[serde(default = "default_true")]
    pub cache_proxy_types: bool,

    /// Access policy
    #[serde(default)]
    pub access: AccessConfig,
}

fn default_true() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            variadic: VariadicPolicy::default(),
            warn_unsupported: true,
            cache_proxy_types: true,
            access: AccessConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    bridge: BridgeConfig,
}

impl BridgeConfig {
    /// Parse from TOML content. A missing `[bridge]` table yields defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.bridge)
    }

    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Build the access policy described by the `[bridge.access]` section
    pub fn access_policy(&self) -> Result<AccessPolicy, ConfigError> {
        let global = AccessPermission::parse(&self.access.global).ok_or_else(|| {
            ConfigError::InvalidPermission {
                key: "global".to_string(),
                value: self.access.global.clone(),
            }
        })?;
        let policy = AccessPolicy::with_global(global);

        for (key, value) in &self.access.types {
            let perms = AccessPermission::parse(value).ok_or_else(|| {
                ConfigError::InvalidPermission {
                    key: key.clone(),
                    value: value.clone(),
                }
            })?;
            if key.contains('*') {
                policy.add_rule(TypePermissionRule {
                    pattern: key.clone(),
                    permissions: perms,
                });
            } else {
                policy.set_type(key, perms);
            }
        }

        Ok(policy)
    }
}
