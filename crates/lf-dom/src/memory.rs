//! Deterministic in-memory page.
//!
//! Models just enough of a browser page to drive the engine headlessly:
//! an anchor arena, capture-then-host event dispatch with default actions,
//! history entry points, host events, queued mutation batches, and a manual
//! clock for timers. Nothing runs until the owner flushes or advances it,
//! which keeps callback ordering explicit.

use crate::contract::HrefContract;
use crate::event::InteractionEvent;
use crate::event::InteractionKind;
use crate::event::Modifiers;
use crate::event::PointerButton;
use crate::history::HistoryApi;
use crate::history::HistoryMethod;
use crate::history::HistoryWrapper;
use crate::mutation::AddedNode;
use crate::mutation::MutationRecord;
use crate::page::AnchorHandle;
use crate::page::Callback;
use crate::page::Disposition;
use crate::page::InteractionHandler;
use crate::page::MutationCallback;
use crate::page::PageHost;
use crate::page::ReadyState;
use lf_core::RedirectError;
use lf_core::RedirectResult;
use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;
use std::time::Duration;

/// Navigation side effect recorded by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Replace(String),
    Assign(String),
    Open {
        href: String,
        disposition: Disposition,
    },
    History {
        method: HistoryMethod,
        /// Non-URL arguments as the original entry point received them.
        state: String,
        url: Option<String>,
    },
}

impl Navigation {
    pub fn href(&self) -> Option<&str> {
        match self {
            Self::Replace(href) | Self::Assign(href) => Some(href.as_str()),
            Self::Open { href, .. } => Some(href.as_str()),
            Self::History { url, .. } => url.as_deref(),
        }
    }
}

/// How a dispatched interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A capture listener suppressed the event.
    Suppressed,
    /// The host page's own click router handled it.
    HostRouted,
    /// The browser default action ran (possibly doing nothing).
    Default,
}

/// Timer handle returned by [`MemoryPage::set_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryTimer(u64);

/// Captured original history entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryHistoryEntry {
    method: HistoryMethod,
}

/// Shared handle to the in-memory page.
#[derive(Clone)]
pub struct MemoryPage {
    state: Rc<RefCell<PageState>>,
}

/// Handle to one anchor of a [`MemoryPage`].
#[derive(Clone)]
pub struct MemoryAnchor {
    page: Weak<RefCell<PageState>>,
    id: usize,
}

struct PageState {
    ready: ReadyState,
    ready_callbacks: Vec<Box<dyn FnOnce()>>,
    location: String,
    location_blocked: bool,
    navigations: Vec<Navigation>,
    anchors: Vec<AnchorNode>,
    host_listeners: Vec<(String, Callback)>,
    observers: Vec<(String, MutationCallback)>,
    pending_mutations: Vec<PendingMutation>,
    timers: Vec<PendingTimer>,
    now: Duration,
    next_timer_id: u64,
    history_wrappers: Vec<(HistoryMethod, HistoryWrapper<String>)>,
    history_captures: usize,
    host_click_routing: bool,
}

#[derive(Default)]
struct AnchorNode {
    attribute: Option<String>,
    converted: bool,
    restricted: bool,
    contract: Option<HrefContract>,
    capture_listeners: Vec<(InteractionKind, InteractionHandler)>,
}

enum PendingMutation {
    Added {
        anchor_href: Option<String>,
        subtree_hrefs: Vec<String>,
    },
    Attribute {
        value: Option<String>,
    },
}

struct PendingTimer {
    id: u64,
    due: Duration,
    task: Box<dyn FnOnce()>,
}

struct MemoryEvent {
    kind: InteractionKind,
    button: PointerButton,
    modifiers: Modifiers,
    suppressed: Cell<bool>,
}

impl InteractionEvent for MemoryEvent {
    fn kind(&self) -> InteractionKind {
        self.kind
    }

    fn button(&self) -> PointerButton {
        self.button
    }

    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    fn suppress(&self) {
        self.suppressed.set(true);
    }
}

impl MemoryPage {
    /// A page that has finished loading at `location`.
    pub fn new(location: &str) -> Self {
        Self::with_ready_state(location, ReadyState::Complete)
    }

    /// A page still parsing; ready callbacks wait for [`Self::finish_loading`].
    pub fn loading(location: &str) -> Self {
        Self::with_ready_state(location, ReadyState::Loading)
    }

    fn with_ready_state(location: &str, ready: ReadyState) -> Self {
        Self {
            state: Rc::new(RefCell::new(PageState {
                ready,
                ready_callbacks: Vec::new(),
                location: location.to_owned(),
                location_blocked: false,
                navigations: Vec::new(),
                anchors: Vec::new(),
                host_listeners: Vec::new(),
                observers: Vec::new(),
                pending_mutations: Vec::new(),
                timers: Vec::new(),
                now: Duration::ZERO,
                next_timer_id: 1,
                history_wrappers: Vec::new(),
                history_captures: 0,
                host_click_routing: false,
            })),
        }
    }

    pub fn finish_loading(&self) {
        let callbacks = {
            let mut state = self.state.borrow_mut();
            state.ready = ReadyState::Interactive;
            std::mem::take(&mut state.ready_callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }

    /// Changes the address without a reload (address-bar edit, external load).
    pub fn set_location(&self, href: &str) {
        self.state.borrow_mut().location = href.to_owned();
    }

    /// Makes location reads fail, as a restricted frame would.
    pub fn block_location(&self, blocked: bool) {
        self.state.borrow_mut().location_blocked = blocked;
    }

    /// Enables the host's own SPA click router, which routes plain primary
    /// clicks through `history.pushState` with the raw attribute value.
    pub fn enable_host_click_routing(&self) {
        self.state.borrow_mut().host_click_routing = true;
    }

    pub fn current_location(&self) -> String {
        self.state.borrow().location.clone()
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.state.borrow().navigations.clone()
    }

    pub fn history_captures(&self) -> usize {
        self.state.borrow().history_captures
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Adds an anchor present from the initial parse; no mutation is queued.
    pub fn add_anchor(&self, href: &str) -> MemoryAnchor {
        self.insert_anchor(Some(href.to_owned()))
    }

    pub fn add_anchor_without_href(&self) -> MemoryAnchor {
        self.insert_anchor(None)
    }

    /// Host inserts a single anchor after load.
    pub fn append_anchor(&self, href: &str) -> MemoryAnchor {
        let anchor = self.insert_anchor(Some(href.to_owned()));
        self.queue_mutation(PendingMutation::Added {
            anchor_href: Some(href.to_owned()),
            subtree_hrefs: Vec::new(),
        });
        anchor
    }

    /// Host inserts a container holding anchors, reported as one added node.
    pub fn append_container(&self, hrefs: &[&str]) -> Vec<MemoryAnchor> {
        let anchors = hrefs
            .iter()
            .map(|href| self.insert_anchor(Some((*href).to_owned())))
            .collect();
        self.queue_mutation(PendingMutation::Added {
            anchor_href: None,
            subtree_hrefs: hrefs.iter().map(|href| (*href).to_owned()).collect(),
        });
        anchors
    }

    /// Host calls `setAttribute("href", value)`, bypassing any accessor.
    pub fn host_set_attribute(&self, anchor: &MemoryAnchor, value: &str) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(node) = state.anchors.get_mut(anchor.id) {
                node.attribute = Some(value.to_owned());
            }
        }
        self.queue_mutation(PendingMutation::Attribute {
            value: Some(value.to_owned()),
        });
    }

    /// Host assigns the `href` property, which honors an installed accessor.
    pub fn host_assign_href(&self, anchor: &MemoryAnchor, value: &str) {
        let stored = {
            let mut state = self.state.borrow_mut();
            let Some(node) = state.anchors.get_mut(anchor.id) else {
                return;
            };
            let stored = match &node.contract {
                Some(contract) => contract.write(value),
                None => value.to_owned(),
            };
            node.attribute = Some(stored.clone());
            stored
        };
        self.queue_mutation(PendingMutation::Attribute {
            value: Some(stored),
        });
    }

    /// Makes every target read on `anchor` fail.
    pub fn restrict(&self, anchor: &MemoryAnchor) {
        if let Some(node) = self.state.borrow_mut().anchors.get_mut(anchor.id) {
            node.restricted = true;
        }
    }

    /// Host page (or the browser) calls a history entry point.
    pub fn host_history(
        &self,
        method: HistoryMethod,
        state: &str,
        url: Option<&str>,
    ) -> RedirectResult<()> {
        let wrapper = self
            .state
            .borrow()
            .history_wrappers
            .iter()
            .rev()
            .find(|(installed, _)| *installed == method)
            .map(|(_, wrapper)| Rc::clone(wrapper));

        match wrapper {
            Some(wrapper) => wrapper(state.to_owned(), url.map(str::to_owned)),
            None => self.invoke(&MemoryHistoryEntry { method }, state.to_owned(), url),
        }
    }

    pub fn emit_host_event(&self, name: &str) {
        let callbacks: Vec<Callback> = self
            .state
            .borrow()
            .host_listeners
            .iter()
            .filter(|(listened, _)| listened == name)
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Delivers queued mutation records to observers as one batch.
    pub fn flush_mutations(&self) {
        let (pending, observers) = {
            let mut state = self.state.borrow_mut();
            if state.pending_mutations.is_empty() || state.observers.is_empty() {
                state.pending_mutations.clear();
                return;
            }
            let observers: Vec<(String, MutationCallback)> = state
                .observers
                .iter()
                .map(|(needle, callback)| (needle.clone(), Rc::clone(callback)))
                .collect();
            (std::mem::take(&mut state.pending_mutations), observers)
        };

        for (needle, callback) in observers {
            let records: Vec<MutationRecord> = pending
                .iter()
                .map(|mutation| summarize_mutation(mutation, &needle))
                .collect();
            callback(&records);
        }
    }

    /// Moves the clock forward, running mutation deliveries and due timers
    /// in deadline order.
    pub fn advance(&self, by: Duration) {
        self.flush_mutations();
        let target = self.state.borrow().now.saturating_add(by);

        loop {
            let task = {
                let mut state = self.state.borrow_mut();
                let next = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(_, timer)| (timer.due, timer.id))
                    .map(|(index, _)| index);
                match next {
                    Some(index) => {
                        let timer = state.timers.remove(index);
                        state.now = timer.due;
                        timer.task
                    }
                    None => break,
                }
            };
            task();
            self.flush_mutations();
        }

        self.state.borrow_mut().now = target;
    }

    /// Dispatches an interaction on `anchor`: capture listeners first, then
    /// the host router, then the browser default action.
    pub fn dispatch(
        &self,
        anchor: &MemoryAnchor,
        kind: InteractionKind,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> DispatchOutcome {
        let listeners: Vec<InteractionHandler> = {
            let state = self.state.borrow();
            let Some(node) = state.anchors.get(anchor.id) else {
                return DispatchOutcome::Default;
            };
            node.capture_listeners
                .iter()
                .filter(|(listened, _)| *listened == kind)
                .map(|(_, handler)| Rc::clone(handler))
                .collect()
        };

        let event = MemoryEvent {
            kind,
            button,
            modifiers,
            suppressed: Cell::new(false),
        };
        for listener in listeners {
            if event.suppressed.get() {
                break;
            }
            listener(&event);
        }
        if event.suppressed.get() {
            return DispatchOutcome::Suppressed;
        }

        let (attribute, host_routing) = {
            let state = self.state.borrow();
            let attribute = state
                .anchors
                .get(anchor.id)
                .and_then(|node| node.attribute.clone());
            (attribute, state.host_click_routing)
        };
        let Some(attribute) = attribute else {
            return DispatchOutcome::Default;
        };

        let plain = modifiers == Modifiers::none();
        match (kind, button) {
            (InteractionKind::Click, PointerButton::Primary) if plain && host_routing => {
                let _ = self.host_history(HistoryMethod::Push, "host-route", Some(attribute.as_str()));
                DispatchOutcome::HostRouted
            }
            (InteractionKind::Click, PointerButton::Primary) => {
                let navigation = if modifiers.shift {
                    Navigation::Open {
                        href: attribute,
                        disposition: Disposition::ForegroundTab,
                    }
                } else if modifiers.ctrl || modifiers.meta {
                    Navigation::Open {
                        href: attribute,
                        disposition: Disposition::BackgroundTab,
                    }
                } else {
                    Navigation::Assign(attribute)
                };
                self.record(navigation);
                DispatchOutcome::Default
            }
            // Middle-press opens straight from the attribute once listeners ran.
            (InteractionKind::PressDown, PointerButton::Auxiliary) => {
                self.record(Navigation::Open {
                    href: attribute,
                    disposition: Disposition::BackgroundTab,
                });
                DispatchOutcome::Default
            }
            _ => DispatchOutcome::Default,
        }
    }

    fn insert_anchor(&self, attribute: Option<String>) -> MemoryAnchor {
        let mut state = self.state.borrow_mut();
        state.anchors.push(AnchorNode {
            attribute,
            ..AnchorNode::default()
        });
        MemoryAnchor {
            page: Rc::downgrade(&self.state),
            id: state.anchors.len().saturating_sub(1),
        }
    }

    fn queue_mutation(&self, mutation: PendingMutation) {
        self.state.borrow_mut().pending_mutations.push(mutation);
    }

    fn record(&self, navigation: Navigation) {
        let mut state = self.state.borrow_mut();
        let moves_page = !matches!(navigation, Navigation::Open { .. });
        if let Some(href) = navigation.href().filter(|_| moves_page) {
            let resolved = resolve_location(&state.location, href);
            state.location = resolved;
        }
        state.navigations.push(navigation);
    }
}

impl MemoryAnchor {
    /// Raw attribute value, bypassing any accessor.
    pub fn attribute(&self) -> Option<String> {
        self.with_node(|node| node.attribute.clone()).flatten()
    }

    pub fn listener_count(&self) -> usize {
        self.with_node(|node| node.capture_listeners.len())
            .unwrap_or_default()
    }

    pub fn has_contract(&self) -> bool {
        self.with_node(|node| node.contract.is_some())
            .unwrap_or_default()
    }

    fn with_node<T>(&self, f: impl FnOnce(&mut AnchorNode) -> T) -> Option<T> {
        let page = self.page.upgrade()?;
        let mut state = page.borrow_mut();
        state.anchors.get_mut(self.id).map(f)
    }

    fn try_with_node<T>(&self, f: impl FnOnce(&mut AnchorNode) -> T) -> RedirectResult<T> {
        self.with_node(f).ok_or_else(|| {
            RedirectError::new(
                "page.anchor_detached",
                format!("anchor {} is no longer attached", self.id),
            )
        })
    }
}

impl AnchorHandle for MemoryAnchor {
    fn href(&self) -> RedirectResult<Option<String>> {
        let (attribute, contract) = self.try_with_node(|node| {
            if node.restricted {
                return Err(RedirectError::new(
                    "page.anchor_restricted",
                    "access to anchor target is restricted",
                ));
            }
            Ok((node.attribute.clone(), node.contract.clone()))
        })??;

        Ok(match (attribute, contract) {
            (Some(attribute), Some(contract)) => Some(contract.read(&attribute)),
            (attribute, _) => attribute,
        })
    }

    fn set_href_attribute(&self, href: &str) -> RedirectResult<()> {
        self.try_with_node(|node| node.attribute = Some(href.to_owned()))?;
        if let Some(page) = self.page.upgrade() {
            page.borrow_mut()
                .pending_mutations
                .push(PendingMutation::Attribute {
                    value: Some(href.to_owned()),
                });
        }
        Ok(())
    }

    fn is_converted(&self) -> bool {
        self.with_node(|node| node.converted).unwrap_or_default()
    }

    fn mark_converted(&self) -> RedirectResult<()> {
        self.try_with_node(|node| node.converted = true)
    }

    fn install_href_contract(&self, contract: HrefContract) -> RedirectResult<()> {
        self.try_with_node(|node| node.contract = Some(contract))
    }

    fn add_capture_listener(
        &self,
        kind: InteractionKind,
        handler: InteractionHandler,
    ) -> RedirectResult<()> {
        self.try_with_node(|node| node.capture_listeners.push((kind, handler)))
    }
}

impl PageHost for MemoryPage {
    type Anchor = MemoryAnchor;
    type Timer = MemoryTimer;

    fn ready_state(&self) -> ReadyState {
        self.state.borrow().ready
    }

    fn when_ready(&self, callback: Box<dyn FnOnce()>) -> RedirectResult<()> {
        if self.ready_state().is_loading() {
            self.state.borrow_mut().ready_callbacks.push(callback);
        } else {
            callback();
        }
        Ok(())
    }

    fn location_href(&self) -> RedirectResult<String> {
        let state = self.state.borrow();
        if state.location_blocked {
            return Err(RedirectError::new(
                "page.location_unavailable",
                "location access is blocked",
            ));
        }
        Ok(state.location.clone())
    }

    fn replace_location(&self, href: &str) -> RedirectResult<()> {
        self.record(Navigation::Replace(href.to_owned()));
        Ok(())
    }

    fn assign_location(&self, href: &str) -> RedirectResult<()> {
        self.record(Navigation::Assign(href.to_owned()));
        Ok(())
    }

    fn open_new_context(&self, href: &str, disposition: Disposition) -> RedirectResult<()> {
        self.record(Navigation::Open {
            href: href.to_owned(),
            disposition,
        });
        Ok(())
    }

    fn anchors_mentioning(&self, needle: &str) -> RedirectResult<Vec<MemoryAnchor>> {
        let needle = needle.to_ascii_lowercase();
        let state = self.state.borrow();
        Ok(state
            .anchors
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                node.attribute
                    .as_deref()
                    .is_some_and(|href| href.to_ascii_lowercase().contains(&needle))
            })
            .map(|(id, _)| MemoryAnchor {
                page: Rc::downgrade(&self.state),
                id,
            })
            .collect())
    }

    fn listen_host_event(&self, name: &str, callback: Callback) -> RedirectResult<()> {
        self.state
            .borrow_mut()
            .host_listeners
            .push((name.to_owned(), callback));
        Ok(())
    }

    fn observe_body(&self, needle: &str, callback: MutationCallback) -> RedirectResult<()> {
        self.state
            .borrow_mut()
            .observers
            .push((needle.to_ascii_lowercase(), callback));
        Ok(())
    }

    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> RedirectResult<MemoryTimer> {
        let mut state = self.state.borrow_mut();
        let id = state.next_timer_id;
        state.next_timer_id = id.saturating_add(1);
        let due = state.now.saturating_add(delay);
        state.timers.push(PendingTimer { id, due, task });
        Ok(MemoryTimer(id))
    }

    fn clear_timeout(&self, timer: MemoryTimer) {
        self.state
            .borrow_mut()
            .timers
            .retain(|pending| pending.id != timer.0);
    }
}

impl HistoryApi for MemoryPage {
    type State = String;
    type Entry = MemoryHistoryEntry;

    fn capture(&self, method: HistoryMethod) -> RedirectResult<MemoryHistoryEntry> {
        let mut state = self.state.borrow_mut();
        state.history_captures = state.history_captures.saturating_add(1);
        Ok(MemoryHistoryEntry { method })
    }

    fn invoke(
        &self,
        entry: &MemoryHistoryEntry,
        state: String,
        url: Option<&str>,
    ) -> RedirectResult<()> {
        self.record(Navigation::History {
            method: entry.method,
            state,
            url: url.map(str::to_owned),
        });
        Ok(())
    }

    fn install(
        &self,
        method: HistoryMethod,
        wrapper: HistoryWrapper<String>,
    ) -> RedirectResult<()> {
        self.state
            .borrow_mut()
            .history_wrappers
            .push((method, wrapper));
        Ok(())
    }
}

fn summarize_mutation(mutation: &PendingMutation, needle: &str) -> MutationRecord {
    match mutation {
        PendingMutation::Added {
            anchor_href,
            subtree_hrefs,
        } => MutationRecord::ChildList {
            added: vec![AddedNode {
                anchor_href: anchor_href.clone(),
                subtree_mentions_marker: subtree_hrefs
                    .iter()
                    .any(|href| href.to_ascii_lowercase().contains(needle)),
            }],
        },
        PendingMutation::Attribute { value } => MutationRecord::Attribute {
            name: "href".to_owned(),
            value: value.clone(),
        },
    }
}

// Path-absolute targets keep the current scheme and host.
fn resolve_location(current: &str, href: &str) -> String {
    if !href.starts_with('/') || href.starts_with("//") {
        return href.to_owned();
    }
    let origin_end = current
        .find("://")
        .and_then(|scheme_end| {
            current[scheme_end + 3..]
                .find('/')
                .map(|offset| scheme_end + 3 + offset)
        })
        .unwrap_or(current.len());
    format!("{}{href}", &current[..origin_end])
}

#[cfg(test)]
mod tests {
    use super::DispatchOutcome;
    use super::MemoryPage;
    use super::Navigation;
    use super::resolve_location;
    use crate::event::InteractionKind;
    use crate::event::Modifiers;
    use crate::event::PointerButton;
    use crate::history::HistoryMethod;
    use crate::mutation::MutationRecord;
    use crate::page::AnchorHandle;
    use crate::page::PageHost;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn resolves_path_absolute_locations() {
        assert_eq!(
            resolve_location("https://host/feed?x=1", "/watch?v=a"),
            "https://host/watch?v=a"
        );
        assert_eq!(resolve_location("https://host", "/a"), "https://host/a");
        assert_eq!(
            resolve_location("https://host/a", "https://other/b"),
            "https://other/b"
        );
    }

    #[test]
    fn timers_run_in_deadline_order_and_can_be_cleared() {
        let page = MemoryPage::new("https://host/");
        let log = Rc::new(RefCell::new(Vec::new()));

        let late = Rc::clone(&log);
        let early = Rc::clone(&log);
        let cancelled = Rc::clone(&log);
        let _ = page.set_timeout(
            Duration::from_millis(20),
            Box::new(move || late.borrow_mut().push("late")),
        );
        let _ = page.set_timeout(
            Duration::from_millis(10),
            Box::new(move || early.borrow_mut().push("early")),
        );
        let timer = match page.set_timeout(
            Duration::from_millis(15),
            Box::new(move || cancelled.borrow_mut().push("cancelled")),
        ) {
            Ok(timer) => timer,
            Err(error) => panic!("{error}"),
        };
        page.clear_timeout(timer);

        page.advance(Duration::from_millis(15));
        assert_eq!(*log.borrow(), vec!["early"]);
        page.advance(Duration::from_millis(5));
        assert_eq!(*log.borrow(), vec!["early", "late"]);
        assert_eq!(page.pending_timers(), 0);
        assert_eq!(page.now(), Duration::from_millis(20));
    }

    #[test]
    fn unhandled_click_follows_attribute() {
        let page = MemoryPage::new("https://host/");
        let anchor = page.add_anchor("https://host/shorts/abc");
        let outcome = page.dispatch(
            &anchor,
            InteractionKind::Click,
            PointerButton::Primary,
            Modifiers::none(),
        );
        assert_eq!(outcome, DispatchOutcome::Default);
        assert_eq!(
            page.navigations(),
            vec![Navigation::Assign("https://host/shorts/abc".to_owned())]
        );
        assert_eq!(page.current_location(), "https://host/shorts/abc");
    }

    #[test]
    fn host_router_pushes_raw_attribute() {
        let page = MemoryPage::new("https://host/");
        page.enable_host_click_routing();
        let anchor = page.add_anchor("/shorts/abc");
        let outcome = page.dispatch(
            &anchor,
            InteractionKind::Click,
            PointerButton::Primary,
            Modifiers::none(),
        );
        assert_eq!(outcome, DispatchOutcome::HostRouted);
        assert_eq!(
            page.navigations(),
            vec![Navigation::History {
                method: HistoryMethod::Push,
                state: "host-route".to_owned(),
                url: Some("/shorts/abc".to_owned()),
            }]
        );
        assert_eq!(page.current_location(), "https://host/shorts/abc");
    }

    #[test]
    fn mutations_are_batched_until_flushed() {
        let page = MemoryPage::new("https://host/");
        let batches = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&batches);
        let observed = page.observe_body(
            "/shorts/",
            Rc::new(move |records: &[MutationRecord]| sink.borrow_mut().push(records.to_vec())),
        );
        assert!(observed.is_ok());

        page.append_container(&["https://host/watch?v=1", "https://host/SHORTS/2"]);
        let anchor = page.append_anchor("https://host/about");
        page.host_set_attribute(&anchor, "https://host/shorts/3");
        assert!(batches.borrow().is_empty());

        page.flush_mutations();
        let batches = batches.borrow();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
        match &batches[0][0] {
            MutationRecord::ChildList { added } => assert!(added[0].subtree_mentions_marker),
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn restricted_anchor_reads_fail() {
        let page = MemoryPage::new("https://host/");
        let anchor = page.add_anchor("https://host/shorts/abc");
        page.restrict(&anchor);
        let error = match anchor.href() {
            Ok(value) => panic!("expected restricted read, got {value:?}"),
            Err(error) => error,
        };
        assert!(error.has_code("page.anchor_restricted"));
    }

    #[test]
    fn ready_callbacks_wait_for_loading_to_finish() {
        let page = MemoryPage::loading("https://host/");
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        assert!(page.when_ready(Box::new(move || *flag.borrow_mut() = true)).is_ok());
        assert!(!*ran.borrow());
        page.finish_loading();
        assert!(*ran.borrow());
    }
}
