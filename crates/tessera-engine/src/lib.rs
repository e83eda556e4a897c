//! Tessera Engine
//!
//! The capability surface the session layer needs from a rendering engine:
//! navigation primitives, state reads, script evaluation, an ordered event
//! subscription list, and construction bound to a storage domain.
//!
//! The renderer itself is an external collaborator. [`memory::MemoryEngine`]
//! is an in-process engine that models history, cookie jars and events
//! without drawing anything, used by tests and headless runs.

mod domain;
mod error;
mod event;
pub mod memory;
mod view;

pub use domain::StorageDomain;
pub use error::EngineError;
pub use event::{
    EngineEvent, MediaKind, MediaPermissionRequest, PermissionDecision, PermissionResponder,
};
pub use view::{ConsumerList, Engine, EngineView, EventConsumer, SubscriptionId, ViewId};

pub type Result<T> = std::result::Result<T, EngineError>;
