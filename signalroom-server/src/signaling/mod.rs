mod hub;
mod message_router;
mod ws_handler;

pub use hub::*;
pub use message_router::*;
pub use ws_handler::*;
