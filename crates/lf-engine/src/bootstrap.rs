//! One-shot wiring of the engine to a page.

use crate::address::AddressGuard;
use crate::config::RedirectConfig;
use crate::links::LinkRewriter;
use crate::navigation::NavigationInterceptor;
use crate::observer::ChangeObserver;
use crate::stats::EngineStats;
use lf_core::RedirectResult;
use lf_dom::HistoryApi;
use lf_dom::PageHost;
use lf_url::Normalizer;
use std::cell::Cell;
use std::cell::OnceCell;
use std::rc::Rc;

/// What a call to [`Bootstrap::start`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// The document is still loading; the sequence runs when it is ready.
    Deferred,
    /// The page address was short-form and has been replaced.
    Redirected,
    Installed,
    AlreadyStarted,
}

/// Owns every engine component for one page.
pub struct Bootstrap<P: PageHost, H: HistoryApi> {
    page: Rc<P>,
    history: Rc<H>,
    config: RedirectConfig,
    normalizer: Rc<Normalizer>,
    stats: Rc<EngineStats>,
    guard: Rc<AddressGuard<P>>,
    rewriter: Rc<LinkRewriter<P>>,
    interceptor: OnceCell<Rc<NavigationInterceptor<H>>>,
    observer: OnceCell<Rc<ChangeObserver<P>>>,
    started: Cell<bool>,
}

impl<P: PageHost, H: HistoryApi> Bootstrap<P, H> {
    pub fn new(page: Rc<P>, history: Rc<H>, config: RedirectConfig) -> RedirectResult<Rc<Self>> {
        config.validate()?;
        let normalizer = Rc::new(Normalizer::new(config.normalizer.clone())?);
        let stats = Rc::new(EngineStats::default());
        let guard = Rc::new(AddressGuard::new(
            Rc::clone(&page),
            Rc::clone(&normalizer),
            Rc::clone(&stats),
            config.redirect_direct_loads,
        ));
        let rewriter = Rc::new(LinkRewriter::new(
            Rc::clone(&page),
            Rc::clone(&normalizer),
            Rc::clone(&stats),
        ));

        Ok(Rc::new(Self {
            page,
            history,
            config,
            normalizer,
            stats,
            guard,
            rewriter,
            interceptor: OnceCell::new(),
            observer: OnceCell::new(),
            started: Cell::new(false),
        }))
    }

    pub fn config(&self) -> &RedirectConfig {
        &self.config
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn interceptor(&self) -> Option<&Rc<NavigationInterceptor<H>>> {
        self.interceptor.get()
    }

    pub fn observer(&self) -> Option<&Rc<ChangeObserver<P>>> {
        self.observer.get()
    }

    /// Runs the sequence now, or once the document is ready. Later calls
    /// return [`BootOutcome::AlreadyStarted`].
    pub fn start(self: &Rc<Self>) -> BootOutcome {
        if self.started.replace(true) {
            return BootOutcome::AlreadyStarted;
        }

        if self.page.ready_state().is_loading() {
            let this = Rc::clone(self);
            let deferred = self.page.when_ready(Box::new(move || {
                this.run();
            }));
            if self.stats.absorb("ready wait", deferred).is_some() {
                log::debug!("document loading; bootstrap deferred");
                return BootOutcome::Deferred;
            }
        }

        self.run()
    }

    fn run(&self) -> BootOutcome {
        if let Some(true) = self.stats.absorb("address check", self.guard.check()) {
            return BootOutcome::Redirected;
        }

        if let Some(interceptor) = self.intercept() {
            self.stats.absorb("history install", interceptor.install());
        }

        self.stats.absorb("initial scan", self.rewriter.scan());

        let observer = self.observer.get_or_init(|| {
            ChangeObserver::new(
                Rc::clone(&self.page),
                Rc::clone(&self.rewriter),
                Rc::clone(&self.guard),
                Rc::clone(&self.normalizer),
                Rc::clone(&self.stats),
                self.config.scan_debounce(),
                self.config.host_events.clone(),
            )
        });
        self.stats.absorb("observer install", observer.install());

        log::info!("short-form redirection active");
        BootOutcome::Installed
    }

    fn intercept(&self) -> Option<&Rc<NavigationInterceptor<H>>> {
        if self.interceptor.get().is_none() {
            let captured = NavigationInterceptor::capture(
                Rc::clone(&self.history),
                Rc::clone(&self.normalizer),
                Rc::clone(&self.stats),
            );
            let interceptor = self.stats.absorb("history capture", captured)?;
            let _ = self.interceptor.set(interceptor);
        }
        self.interceptor.get()
    }
}
