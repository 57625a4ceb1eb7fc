//! Session coordination for the Atelier studio client process.
//!
//! Three cooperating pieces back the multi-pane editing surface:
//!
//! - [`channels::ChannelRegistry`]: reference-counted membership in
//!   realtime channels keyed by entity id (version id, debug session token).
//! - [`tabs::TabSessionManager`]: the per-version ordered registry of open
//!   editor tabs, with exclusive activation.
//! - [`scheduler::PeriodicScheduler`]: owner-keyed recurring background
//!   tasks (token renewal, release-history polling) with explicit teardown.
//!
//! [`session::SessionCoordinator`] owns one of each and ties their lifecycles
//! together: entering a version joins its channel, leaving it clears the tab
//! registry and releases the channel, and losing authentication stops every
//! background task that depended on it.

pub mod channels;
pub mod error;
pub mod scheduler;
pub mod session;
pub mod tabs;

pub use channels::{ChannelRegistry, RealtimeTransport};
pub use error::TransportError;
pub use scheduler::PeriodicScheduler;
pub use session::{SessionConfig, SessionCoordinator};
pub use tabs::{Tab, TabDescriptor, TabKind, TabSessionManager};
