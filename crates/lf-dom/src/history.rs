//! History-mutation entry points.

use lf_core::RedirectResult;
use std::rc::Rc;

/// The two SPA navigation entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryMethod {
    Push,
    Replace,
}

impl HistoryMethod {
    pub const ALL: [Self; 2] = [Self::Push, Self::Replace];

    /// Property name on the page's `history` object.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "pushState",
            Self::Replace => "replaceState",
        }
    }
}

/// Replacement installed in place of an entry point. Receives the opaque
/// state arguments and the URL argument, if the caller passed one.
pub type HistoryWrapper<S> = Rc<dyn Fn(S, Option<String>) -> RedirectResult<()>>;

/// Access to the page's history entry points.
pub trait HistoryApi: 'static {
    /// Non-URL arguments, forwarded untouched.
    type State: 'static;
    /// A captured original entry point.
    type Entry: 'static;

    /// Captures the entry point currently installed for `method`.
    fn capture(&self, method: HistoryMethod) -> RedirectResult<Self::Entry>;

    /// Calls a captured original.
    fn invoke(
        &self,
        entry: &Self::Entry,
        state: Self::State,
        url: Option<&str>,
    ) -> RedirectResult<()>;

    /// Replaces the page's entry point for `method` with `wrapper`.
    fn install(
        &self,
        method: HistoryMethod,
        wrapper: HistoryWrapper<Self::State>,
    ) -> RedirectResult<()>;
}
