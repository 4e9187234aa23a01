pub mod error;
pub mod model;

pub use error::ParseError;
pub use model::*;
