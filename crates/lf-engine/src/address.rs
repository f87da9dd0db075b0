//! Direct-address check.

use crate::stats::EngineStats;
use lf_core::RedirectResult;
use lf_dom::PageHost;
use lf_url::Normalizer;
use std::rc::Rc;

/// Replaces the page when its own address is short-form.
///
/// Covers paths that bypass anchors and the wrapped history entry points:
/// address-bar edits, external links, reloads.
pub struct AddressGuard<P: PageHost> {
    page: Rc<P>,
    normalizer: Rc<Normalizer>,
    stats: Rc<EngineStats>,
    enabled: bool,
}

impl<P: PageHost> AddressGuard<P> {
    pub fn new(
        page: Rc<P>,
        normalizer: Rc<Normalizer>,
        stats: Rc<EngineStats>,
        enabled: bool,
    ) -> Self {
        Self {
            page,
            normalizer,
            stats,
            enabled,
        }
    }

    /// Returns true when a redirect was issued.
    pub fn check(&self) -> RedirectResult<bool> {
        if !self.enabled {
            return Ok(false);
        }

        let href = self.page.location_href()?;
        let Some(canonical) = self.normalizer.canonicalize(&href) else {
            return Ok(false);
        };
        if canonical.as_str() == href {
            return Ok(false);
        }

        self.page.replace_location(canonical.as_str())?;
        self.stats.record_redirect();
        log::info!("redirected {href} to {canonical}");
        Ok(true)
    }
}
