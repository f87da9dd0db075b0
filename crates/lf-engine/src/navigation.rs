//! History entry-point interception.

use crate::stats::EngineStats;
use lf_core::RedirectResult;
use lf_dom::HistoryApi;
use lf_dom::HistoryMethod;
use lf_dom::HistoryWrapper;
use lf_url::Normalizer;
use std::borrow::Cow;
use std::cell::Cell;
use std::rc::Rc;

/// Decorator over the page's push/replace entry points.
///
/// The originals are captured once, at construction, and every wrapper
/// forwards to those captures, so installing again never wraps a wrapper.
pub struct NavigationInterceptor<H: HistoryApi> {
    history: Rc<H>,
    push: H::Entry,
    replace: H::Entry,
    normalizer: Rc<Normalizer>,
    stats: Rc<EngineStats>,
    installed: Cell<bool>,
}

impl<H: HistoryApi> NavigationInterceptor<H> {
    pub fn capture(
        history: Rc<H>,
        normalizer: Rc<Normalizer>,
        stats: Rc<EngineStats>,
    ) -> RedirectResult<Rc<Self>> {
        let push = history.capture(HistoryMethod::Push)?;
        let replace = history.capture(HistoryMethod::Replace)?;

        Ok(Rc::new(Self {
            history,
            push,
            replace,
            normalizer,
            stats,
            installed: Cell::new(false),
        }))
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get()
    }

    /// Replaces both entry points on the page with normalizing wrappers.
    pub fn install(self: &Rc<Self>) -> RedirectResult<()> {
        if self.installed.get() {
            return Ok(());
        }

        for method in HistoryMethod::ALL {
            // The page keeps the wrapper for its whole lifetime, so it holds
            // the interceptor strongly.
            let interceptor = Rc::clone(self);
            let wrapper: HistoryWrapper<H::State> =
                Rc::new(move |state: H::State, url: Option<String>| {
                    interceptor.forward(method, state, url.as_deref())
                });
            self.history.install(method, wrapper)?;
        }

        self.installed.set(true);
        log::info!("history entry points wrapped");
        Ok(())
    }

    pub fn push_state(&self, state: H::State, url: Option<&str>) -> RedirectResult<()> {
        self.forward(HistoryMethod::Push, state, url)
    }

    pub fn replace_state(&self, state: H::State, url: Option<&str>) -> RedirectResult<()> {
        self.forward(HistoryMethod::Replace, state, url)
    }

    /// Normalizes `url` and calls the captured original for `method`.
    pub fn forward(
        &self,
        method: HistoryMethod,
        state: H::State,
        url: Option<&str>,
    ) -> RedirectResult<()> {
        let entry = match method {
            HistoryMethod::Push => &self.push,
            HistoryMethod::Replace => &self.replace,
        };

        let Some(url) = url else {
            return self.history.invoke(entry, state, None);
        };

        let normalized = self.normalizer.normalize(url);
        if let Cow::Owned(rewritten) = &normalized {
            self.stats.record_history_rewrite();
            log::debug!("{} {url} rewritten to {rewritten}", method.as_str());
        }
        self.history.invoke(entry, state, Some(normalized.as_ref()))
    }
}
