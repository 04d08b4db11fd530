use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First player version with case-sensitive property names.
pub const CASE_SENSITIVE_VERSION: u8 = 7;

const DEFAULT_VERSION: u8 = 8;
const DEFAULT_MEMORY_LIMIT: usize = 64 * 1024 * 1024;
const DEFAULT_GC_THRESHOLD: usize = 1024 * 1024;
const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid runtime configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings of one context, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Player version the scripts target; below 7 property names match
    /// case-insensitively as a fallback.
    pub version: u8,
    /// Hard quota in bytes for objects and property slots.
    pub memory_limit: usize,
    /// Bytes in use above which a collection is due at the next safe point.
    pub gc_threshold: usize,
    pub gc_enabled: bool,
    pub max_call_depth: usize,
    /// Wall-clock budget of one top-level execution.
    pub run_timeout_ms: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            gc_threshold: DEFAULT_GC_THRESHOLD,
            gc_enabled: true,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            run_timeout_ms: None,
        }
    }
}

impl RuntimeConfig {
    /// Parses a JSON object; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = bytes;
        self
    }

    pub fn with_gc_enabled(mut self, enabled: bool) -> Self {
        self.gc_enabled = enabled;
        self
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.version >= CASE_SENSITIVE_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RuntimeConfig::from_json(r#"{ "version": 6, "memory_limit": 4096 }"#)
            .expect("valid config");
        assert_eq!(config.version, 6);
        assert_eq!(config.memory_limit, 4096);
        assert_eq!(config.gc_threshold, DEFAULT_GC_THRESHOLD);
        assert!(config.gc_enabled);
        assert!(!config.is_case_sensitive());
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = RuntimeConfig::from_json("{ version: ").unwrap_err();
        assert!(err.to_string().starts_with("invalid runtime configuration"));
    }

    #[test]
    fn builder_helpers() {
        let config = RuntimeConfig::default()
            .with_version(7)
            .with_memory_limit(1024)
            .with_gc_enabled(false);
        assert!(config.is_case_sensitive());
        assert_eq!(config.memory_limit, 1024);
        assert!(!config.gc_enabled);
    }
}
