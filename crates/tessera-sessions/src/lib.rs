//! Tessera Sessions
//!
//! - A session is one live engine view, created the first time its item is
//!   selected and kept until the item is deleted, converted or closed
//! - At most one session per item, at most one session shown
//! - Hiding a session keeps its history
//! - Engine events are forwarded after the view's own consumer has seen
//!   them, then delivered on the UI loop
//! - Title, favicon and URL changes are written back to the entity store

mod bridge;
mod dispatch;
mod error;
mod interceptor;
mod registry;
mod session;

pub use bridge::PersistenceBridge;
pub use dispatch::{ui_channel, EventSender, SessionEvent, SessionObserver, UiLoop};
pub use error::SessionError;
pub use interceptor::EventInterceptor;
pub use registry::SessionRegistry;
pub use session::{NavigationFailure, Session, SessionHandle, Visibility};

pub type Result<T> = std::result::Result<T, SessionError>;
