//! Progress and lifecycle events emitted during decomposition.
//! Handlers are injected; nothing in the engine prints directly.

pub mod dispatcher;
pub mod handler;
pub mod logging;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::EnsembleEventHandler;
pub use logging::LoggingEventHandler;
pub use types::*;
