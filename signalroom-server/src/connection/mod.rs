mod connection_state;
mod connection_table;

pub use connection_state::*;
pub use connection_table::*;
