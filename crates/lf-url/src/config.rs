//! Normalizer knobs.

use lf_core::RedirectError;
use lf_core::RedirectResult;
use serde::Deserialize;

const DEFAULT_SHORT_MARKER: &str = "shorts";
const DEFAULT_WATCH_PATH: &str = "/watch";
const DEFAULT_ID_KEY: &str = "v";
const DEFAULT_CARRYOVER_KEYS: &[&str] = &["t", "list", "index"];

/// Path markers and parameter policy used when building canonical URLs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// First path segment that identifies a short-form URL (`shorts`).
    pub short_marker: String,
    pub watch_path: String,
    pub id_key: String,
    /// Keys always carried from the merged parameter set, in output order.
    pub carryover_keys: Vec<String>,
    /// Also carry every other merged key after the allow-list.
    pub carry_all_parameters: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            short_marker: DEFAULT_SHORT_MARKER.to_owned(),
            watch_path: DEFAULT_WATCH_PATH.to_owned(),
            id_key: DEFAULT_ID_KEY.to_owned(),
            carryover_keys: DEFAULT_CARRYOVER_KEYS
                .iter()
                .map(|key| (*key).to_owned())
                .collect(),
            carry_all_parameters: true,
        }
    }
}

impl NormalizerConfig {
    /// Allow-list only, no extra merged keys.
    pub fn allow_list_only() -> Self {
        Self {
            carry_all_parameters: false,
            ..Self::default()
        }
    }

    /// Substring every short-form path contains (`/shorts/`).
    pub fn marker_needle(&self) -> String {
        format!("/{}/", self.short_marker)
    }

    pub fn validate(&self) -> RedirectResult<()> {
        let marker = self.short_marker.as_str();
        if marker.trim().is_empty() {
            return Err(RedirectError::new(
                "config.short_marker_empty",
                "short-form path marker must not be empty",
            ));
        }

        // Matched verbatim against a path segment.
        if marker.contains(['/', '?', '#']) || marker.contains(char::is_whitespace) {
            return Err(RedirectError::new(
                "config.short_marker_invalid",
                format!("short-form path marker `{marker}` must be a single path segment"),
            ));
        }

        if !self.watch_path.starts_with('/') {
            return Err(RedirectError::new(
                "config.watch_path_invalid",
                format!("watch path `{}` must start with `/`", self.watch_path),
            ));
        }

        let watch_lower = self.watch_path.to_ascii_lowercase();
        let needle = self.marker_needle().to_ascii_lowercase();
        if watch_lower.starts_with(&needle) {
            return Err(RedirectError::new(
                "config.watch_path_loops",
                "watch path must not live under the short-form marker",
            ));
        }

        if self.id_key.is_empty() {
            return Err(RedirectError::new(
                "config.id_key_empty",
                "identifier parameter key must not be empty",
            ));
        }

        Ok(())
    }
}
