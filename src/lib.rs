//! Minimal asynchronous ORM and connection pooling over PostgreSQL.
//!
//! Declared entity schemas are derived once into immutable table metadata
//! with precomputed SQL templates; records are marshalled to and from rows
//! through a bounded connection pool.
//!
//! ## Connectivity
//!
//! - [`Config`] — Pool configuration with environment defaults
//! - [`Pool`] — Bounded connection pool with scoped acquisition
//!
//! ## Schema Mapping
//!
//! - [`Field`] — Column descriptor (name, SQL type, key-ness, default)
//! - [`Schema`] — Derived table metadata and SQL templates
//! - [`Registry`] — Once-per-table schema cache
//!
//! ## Execution
//!
//! - [`Backend`] — Read/write seam over pooled connections
//! - [`Tuple`] — One decoded result row
//! - [`Record`] — Entity instance with CRUD operations

pub mod entity;
pub mod executor;
pub mod pool;
pub mod schema;

mod error;
mod value;

pub use entity::*;
pub use error::*;
pub use executor::*;
pub use pool::*;
pub use schema::*;
pub use value::*;

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", stamp)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
