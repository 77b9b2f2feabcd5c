//! Pool configuration

use serde::Deserialize;
use thiserror::Error;

use crate::defaults::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_PROXY_CLASS_SUFFIX, DEFAULT_REUSE_PROXY_CLASSES,
};

/// Errors from loading [`PoolOptions`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into options
    #[error("Invalid pool options: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Options for creating a [`ProxyPool`](crate::ProxyPool)
///
/// Every field has a default, so a partial TOML table is accepted:
///
/// ```toml
/// proxy_class_suffix = "ScopeAdaptor"
/// reuse_proxy_classes = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolOptions {
    /// Infix used when naming synthesized proxy classes
    pub proxy_class_suffix: String,

    /// Share one synthesized class between beans with the same surface
    pub reuse_proxy_classes: bool,

    /// Initial capacity of the proxy cache
    pub initial_capacity: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            proxy_class_suffix: DEFAULT_PROXY_CLASS_SUFFIX.to_string(),
            reuse_proxy_classes: DEFAULT_REUSE_PROXY_CLASSES,
            initial_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl PoolOptions {
    /// Parse options from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Set the proxy class name infix
    pub fn with_proxy_class_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.proxy_class_suffix = suffix.into();
        self
    }

    /// Enable or disable class reuse across equal surfaces
    pub fn with_class_reuse(mut self, reuse: bool) -> Self {
        self.reuse_proxy_classes = reuse;
        self
    }

    /// Set the initial cache capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}
