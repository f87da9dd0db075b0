//! Redirect engine: history interception, anchor rewriting, change
//! observation, and the bootstrap sequence that wires them to a page.

pub mod address;
pub mod bootstrap;
pub mod config;
pub mod links;
pub mod navigation;
pub mod observer;
pub mod stats;

pub use address::AddressGuard;
pub use bootstrap::BootOutcome;
pub use bootstrap::Bootstrap;
pub use config::RedirectConfig;
pub use links::LinkRewriter;
pub use navigation::NavigationInterceptor;
pub use observer::ChangeObserver;
pub use observer::Debouncer;
pub use stats::EngineStats;
pub use stats::StatsSnapshot;
