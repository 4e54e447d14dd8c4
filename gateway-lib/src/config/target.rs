use serde::Deserialize;
use std::collections::HashMap;

/// Per-target-domain request shaping: which paths are fetchable and what
/// per-fingerprint header overlay to apply.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TargetConfig {
    /// Paths callers are allowed to request against this domain.
    /// An empty list means any path is allowed.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Header overlays keyed by fingerprint profile name, applied on top of
    /// the profile's own default header set.
    #[serde(default)]
    pub headers: HashMap<String, HashMap<String, String>>,
}

impl TargetConfig {
    pub fn path_allowed(&self, path: &str) -> bool {
        self.paths.is_empty() || self.paths.iter().any(|p| p == path)
    }
}
