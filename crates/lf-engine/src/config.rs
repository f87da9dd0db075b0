//! Engine configuration.

use lf_core::RedirectError;
use lf_core::RedirectResult;
use lf_url::NormalizerConfig;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_SCAN_DEBOUNCE_MS: u64 = 150;
const MAX_SCAN_DEBOUNCE_MS: u64 = 5_000;
const DEFAULT_HOST_EVENTS: &[&str] = &[
    "yt-navigate-start",
    "yt-navigate-finish",
    "yt-page-data-updated",
    "popstate",
];

/// Runtime configuration for one page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub normalizer: NormalizerConfig,
    /// Quiet period before a triggered rescan runs.
    pub scan_debounce_ms: u64,
    /// Host-emitted events that always trigger a rescan.
    pub host_events: Vec<String>,
    /// Replace the page when its own address is short-form.
    pub redirect_direct_loads: bool,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            scan_debounce_ms: DEFAULT_SCAN_DEBOUNCE_MS,
            host_events: DEFAULT_HOST_EVENTS
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
            redirect_direct_loads: true,
        }
    }
}

impl RedirectConfig {
    /// Parses a JSON override; absent fields keep their defaults.
    pub fn from_json(raw: &str) -> RedirectResult<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|error| {
            RedirectError::new(
                "config.invalid_json",
                format!("failed to parse configuration: {error}"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn scan_debounce(&self) -> Duration {
        Duration::from_millis(self.scan_debounce_ms)
    }

    pub fn validate(&self) -> RedirectResult<()> {
        self.normalizer.validate()?;

        if self.scan_debounce_ms == 0 {
            return Err(RedirectError::new(
                "config.debounce_zero",
                "scan debounce must be greater than zero",
            ));
        }

        if self.scan_debounce_ms > MAX_SCAN_DEBOUNCE_MS {
            return Err(RedirectError::new(
                "config.debounce_too_large",
                format!("scan debounce exceeds hard limit ({MAX_SCAN_DEBOUNCE_MS} ms)"),
            ));
        }

        if self.host_events.iter().any(|name| name.trim().is_empty()) {
            return Err(RedirectError::new(
                "config.host_event_empty",
                "host event names must not be empty",
            ));
        }

        Ok(())
    }
}
