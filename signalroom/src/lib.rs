pub use signalroom_core::model::{ConnectionId, Role, RoomId};

pub mod model {
    pub use signalroom_core::ParseError;
    pub use signalroom_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use signalroom_server::*;
}
