//! Hooks into the order and payment lifecycle.
//!
//! Every API that changes state publishes an event once the change is committed. Subscribers are async closures
//! registered through [`EventHooks`]; they cannot influence the outcome of the operation that triggered them.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
