//! Domain events emitted by storefront aggregates, and an in-memory log to
//! keep them in.

pub mod event;
pub mod log;

pub use event::Event;
pub use log::EventLog;
