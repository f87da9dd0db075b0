//! Content script entry: binds the redirect engine to the live page.
//!
//! Everything outside [`wasm`] is plain Rust so it can be tested natively.
//! The script must run in the page's main world; an isolated world would
//! see its own copies of `history` and of each anchor's accessors.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::HistoryArguments;
#[cfg(target_arch = "wasm32")]
pub use wasm::WebAnchor;
#[cfg(target_arch = "wasm32")]
pub use wasm::WebHistory;
#[cfg(target_arch = "wasm32")]
pub use wasm::WebPage;

use lf_engine::RedirectConfig;
use lf_engine::StatsSnapshot;

/// Page global holding an optional JSON configuration override.
pub const CONFIG_GLOBAL: &str = "__LONGFORM_CONFIG__";
/// Expando property flagging converted anchors.
pub const CONVERTED_MARKER: &str = "__longformConverted";
/// Property on an installed history wrapper pointing at the function it wraps.
pub const ORIGINAL_SLOT: &str = "__longformOriginal";

/// Configuration from the optional override; a missing, blank, or invalid
/// override yields the defaults.
pub fn resolve_config(raw: Option<&str>) -> RedirectConfig {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return RedirectConfig::default();
    };
    match RedirectConfig::from_json(raw) {
        Ok(config) => config,
        Err(error) => {
            log::warn!("ignoring configuration override: {error}");
            RedirectConfig::default()
        }
    }
}

/// Selector for anchors whose `href` attribute contains `needle`, ignoring
/// ASCII case.
pub fn anchor_selector(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("a[href*=\"{escaped}\" i]")
}

pub fn stats_json(snapshot: &StatsSnapshot) -> String {
    match serde_json::to_string(snapshot) {
        Ok(json) => json,
        Err(error) => {
            log::debug!("stats serialization failed: {error}");
            String::from("null")
        }
    }
}
