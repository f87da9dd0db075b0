//! Change observation and debounced rescans.

use crate::address::AddressGuard;
use crate::links::LinkRewriter;
use crate::stats::EngineStats;
use lf_core::RedirectResult;
use lf_dom::MutationRecord;
use lf_dom::PageHost;
use lf_url::Normalizer;
use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;
use std::time::Duration;

/// Single pending timer: scheduling again cancels the previous one.
pub struct Debouncer<P: PageHost> {
    page: Rc<P>,
    delay: Duration,
    pending: RefCell<Option<P::Timer>>,
}

impl<P: PageHost> Debouncer<P> {
    pub fn new(page: Rc<P>, delay: Duration) -> Self {
        Self {
            page,
            delay,
            pending: RefCell::new(None),
        }
    }

    pub fn schedule(&self, task: Box<dyn FnOnce()>) -> RedirectResult<()> {
        if let Some(previous) = self.pending.borrow_mut().take() {
            self.page.clear_timeout(previous);
        }
        let timer = self.page.set_timeout(self.delay, task)?;
        *self.pending.borrow_mut() = Some(timer);
        Ok(())
    }

    /// Forgets the pending timer once it has fired.
    pub fn settle(&self) {
        self.pending.borrow_mut().take();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

/// Watches the page for late-rendered anchors and in-page route changes.
pub struct ChangeObserver<P: PageHost> {
    page: Rc<P>,
    rewriter: Rc<LinkRewriter<P>>,
    guard: Rc<AddressGuard<P>>,
    normalizer: Rc<Normalizer>,
    stats: Rc<EngineStats>,
    debouncer: Debouncer<P>,
    host_events: Vec<String>,
    installed: Cell<bool>,
}

impl<P: PageHost> ChangeObserver<P> {
    pub fn new(
        page: Rc<P>,
        rewriter: Rc<LinkRewriter<P>>,
        guard: Rc<AddressGuard<P>>,
        normalizer: Rc<Normalizer>,
        stats: Rc<EngineStats>,
        scan_debounce: Duration,
        host_events: Vec<String>,
    ) -> Rc<Self> {
        Rc::new(Self {
            debouncer: Debouncer::new(Rc::clone(&page), scan_debounce),
            page,
            rewriter,
            guard,
            normalizer,
            stats,
            host_events,
            installed: Cell::new(false),
        })
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get()
    }

    pub fn has_pending_scan(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Registers the body watch and host event listeners, then checks the
    /// current address once.
    pub fn install(self: &Rc<Self>) -> RedirectResult<()> {
        if self.installed.get() {
            return Ok(());
        }

        let weak = Rc::downgrade(self);
        self.page.observe_body(
            self.normalizer.marker_needle(),
            Rc::new(move |records: &[MutationRecord]| {
                if let Some(observer) = weak.upgrade() {
                    observer.on_mutations(records);
                }
            }),
        )?;

        for name in &self.host_events {
            let weak = Rc::downgrade(self);
            self.page.listen_host_event(
                name,
                Rc::new(move || {
                    if let Some(observer) = weak.upgrade() {
                        observer.trigger();
                    }
                }),
            )?;
        }

        self.installed.set(true);
        log::info!(
            "change observer installed ({} host events)",
            self.host_events.len()
        );

        self.stats.absorb("address check", self.guard.check());
        Ok(())
    }

    /// True when a batch may have introduced a short-form target.
    pub fn is_relevant(&self, records: &[MutationRecord]) -> bool {
        records.iter().any(|record| match record {
            MutationRecord::ChildList { added } => added.iter().any(|node| {
                node.subtree_mentions_marker
                    || node
                        .anchor_href
                        .as_deref()
                        .is_some_and(|href| self.normalizer.is_short_form(href))
            }),
            MutationRecord::Attribute { name, value } => {
                name.eq_ignore_ascii_case("href")
                    && value
                        .as_deref()
                        .is_some_and(|href| self.normalizer.is_short_form(href))
            }
        })
    }

    pub fn on_mutations(self: &Rc<Self>, records: &[MutationRecord]) {
        if self.is_relevant(records) {
            self.trigger();
        }
    }

    /// Address check, then a debounced rescan unless the page is leaving.
    pub fn trigger(self: &Rc<Self>) {
        if let Some(true) = self.stats.absorb("address check", self.guard.check()) {
            return;
        }

        let weak: Weak<Self> = Rc::downgrade(self);
        let scheduled = self.debouncer.schedule(Box::new(move || {
            if let Some(observer) = weak.upgrade() {
                observer.run_scan();
            }
        }));
        self.stats.absorb("scan scheduling", scheduled);
    }

    fn run_scan(&self) {
        self.debouncer.settle();
        self.stats.absorb("scan", self.rewriter.scan());
    }
}
