//! Page and anchor facilities consumed by the engine.

use crate::contract::HrefContract;
use crate::event::InteractionEvent;
use crate::event::InteractionKind;
use crate::mutation::MutationRecord;
use lf_core::RedirectResult;
use std::rc::Rc;
use std::time::Duration;

pub type Callback = Rc<dyn Fn()>;
pub type MutationCallback = Rc<dyn Fn(&[MutationRecord])>;
pub type InteractionHandler = Rc<dyn Fn(&dyn InteractionEvent)>;

/// Document loading phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn from_document_state(value: &str) -> Self {
        match value {
            "loading" => Self::Loading,
            "interactive" => Self::Interactive,
            _ => Self::Complete,
        }
    }

    pub fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Where a new browsing context opened from a link should appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    BackgroundTab,
    ForegroundTab,
}

/// One anchor element of the host page.
///
/// Handles are cheap clones referring to the same element.
pub trait AnchorHandle: Clone + 'static {
    /// Current target as the page would resolve it; `None` when absent.
    fn href(&self) -> RedirectResult<Option<String>>;

    fn set_href_attribute(&self, href: &str) -> RedirectResult<()>;

    fn is_converted(&self) -> bool;

    fn mark_converted(&self) -> RedirectResult<()>;

    /// Overrides the element's target property so reads and writes go
    /// through `contract`.
    fn install_href_contract(&self, contract: HrefContract) -> RedirectResult<()>;

    /// Registers a capture-phase listener for `kind`.
    fn add_capture_listener(
        &self,
        kind: InteractionKind,
        handler: InteractionHandler,
    ) -> RedirectResult<()>;
}

/// The host page: address, anchors, host events, mutation feed, timers.
pub trait PageHost: 'static {
    type Anchor: AnchorHandle;
    type Timer;

    fn ready_state(&self) -> ReadyState;

    /// Runs `callback` once the document stops loading.
    fn when_ready(&self, callback: Box<dyn FnOnce()>) -> RedirectResult<()>;

    fn location_href(&self) -> RedirectResult<String>;

    /// Full-page redirect that replaces the current history entry.
    fn replace_location(&self, href: &str) -> RedirectResult<()>;

    /// Navigates the current context, adding a history entry.
    fn assign_location(&self, href: &str) -> RedirectResult<()>;

    fn open_new_context(&self, href: &str, disposition: Disposition) -> RedirectResult<()>;

    /// Anchors whose target contains `needle` (ASCII case-insensitive).
    fn anchors_mentioning(&self, needle: &str) -> RedirectResult<Vec<Self::Anchor>>;

    fn listen_host_event(&self, name: &str, callback: Callback) -> RedirectResult<()>;

    /// Watches the body subtree for added nodes and `href` attribute changes.
    /// Added elements are flagged when their markup mentions `needle`.
    fn observe_body(&self, needle: &str, callback: MutationCallback) -> RedirectResult<()>;

    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> RedirectResult<Self::Timer>;

    fn clear_timeout(&self, timer: Self::Timer);
}
