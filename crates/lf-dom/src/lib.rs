//! Page platform seam: the DOM, history, and timer facilities the redirect
//! engine drives. The `testing` feature adds an in-memory page for headless
//! runs.

pub mod contract;
pub mod event;
pub mod history;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod mutation;
pub mod page;

pub use contract::HrefContract;
pub use event::InteractionEvent;
pub use event::InteractionKind;
pub use event::Modifiers;
pub use event::PointerButton;
pub use history::HistoryApi;
pub use history::HistoryMethod;
pub use history::HistoryWrapper;
#[cfg(any(test, feature = "testing"))]
pub use memory::DispatchOutcome;
#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryAnchor;
#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryPage;
#[cfg(any(test, feature = "testing"))]
pub use memory::Navigation;
pub use mutation::AddedNode;
pub use mutation::MutationRecord;
pub use page::AnchorHandle;
pub use page::Callback;
pub use page::Disposition;
pub use page::InteractionHandler;
pub use page::MutationCallback;
pub use page::PageHost;
pub use page::ReadyState;
