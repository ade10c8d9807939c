//! Bounded connection pool: configuration, lifecycle, and scoped
//! acquisition over `tokio_postgres` connections.

mod config;
mod manager;

pub use config::*;
pub use manager::*;
