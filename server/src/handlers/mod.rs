//! Request handlers for sync operations.

mod status;
mod trigger;

pub use status::*;
pub use trigger::*;
