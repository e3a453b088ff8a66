//! Registry policy knobs for the semantic core.
//!
//! The configuration is usually embedded in the driver's own settings and
//! handed to [`TypeTable::with_config`](crate::table::TypeTable::with_config).
//! It can also be read from a TOML fragment:
//!
//! ```toml
//! duplicates = "permit"
//! cache_methods = false
//! ```

use serde::Deserialize;

/// How registries treat a registration structurally equal to one they
/// already hold (super-bounds on a trait, impls on a type).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Ignore the repeat and report that nothing was added.
    #[default]
    Deduplicate,
    /// Keep every registration.
    Permit,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SemaConfig {
    pub duplicates: DuplicatePolicy,
    /// Memoize successful method lookups on bounds.
    pub cache_methods: bool,
}

impl Default for SemaConfig {
    fn default() -> Self {
        SemaConfig {
            duplicates: DuplicatePolicy::Deduplicate,
            cache_methods: true,
        }
    }
}

impl SemaConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse sema config: {}", e))
    }
}
