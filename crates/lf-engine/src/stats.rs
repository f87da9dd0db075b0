//! Engine counters and the fail-open absorption point.

use lf_core::RedirectResult;
use serde::Serialize;
use std::cell::Cell;

/// Running counters for one page.
#[derive(Debug, Default)]
pub struct EngineStats {
    scans: Cell<u64>,
    anchors_converted: Cell<u64>,
    redirects: Cell<u64>,
    history_rewrites: Cell<u64>,
    absorbed_failures: Cell<u64>,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub scans: u64,
    pub anchors_converted: u64,
    pub redirects: u64,
    pub history_rewrites: u64,
    pub absorbed_failures: u64,
}

impl EngineStats {
    pub fn record_scan(&self, converted: usize) {
        bump(&self.scans, 1);
        bump(&self.anchors_converted, converted as u64);
    }

    pub fn record_redirect(&self) {
        bump(&self.redirects, 1);
    }

    pub fn record_history_rewrite(&self) {
        bump(&self.history_rewrites, 1);
    }

    /// Outermost handling for an independently triggered operation: failures
    /// are counted, logged, and dropped so the page keeps working unmodified.
    pub fn absorb<T>(&self, operation: &str, result: RedirectResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                bump(&self.absorbed_failures, 1);
                log::debug!("{operation} abandoned: {error}");
                None
            }
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            scans: self.scans.get(),
            anchors_converted: self.anchors_converted.get(),
            redirects: self.redirects.get(),
            history_rewrites: self.history_rewrites.get(),
            absorbed_failures: self.absorbed_failures.get(),
        }
    }
}

fn bump(counter: &Cell<u64>, by: u64) {
    counter.set(counter.get().saturating_add(by));
}
