mod event_bus;
mod lifecycle_event;
mod lifecycle_sink;
mod session_journal;
mod tracing_sink;

pub use event_bus::*;
pub use lifecycle_event::*;
pub use lifecycle_sink::*;
pub use session_journal::*;
pub use tracing_sink::*;
