//! Database module for PostgreSQL persistence.

mod entities;
mod pool;

pub use entities::*;
pub use pool::*;
