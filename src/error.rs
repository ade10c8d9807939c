use crate::PgErr;
use std::time::Duration;

/// Failure taxonomy for schema derivation, pool lifecycle, and execution.
///
/// Schema and configuration errors are unrecoverable for the type or pool
/// they concern and abort registration or startup. Driver errors keep the
/// underlying error as their source and carry the attempted SQL for
/// diagnostics. Nothing here is transport-specific; callers convert these
/// into whatever their boundary needs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Zero or duplicate primary keys, or conflicting attribute names.
    #[error("schema derivation failed for table ({table}): {reason}")]
    Schema { table: String, reason: String },

    /// Missing or inconsistent pool configuration.
    #[error("invalid pool configuration: {0}")]
    Config(String),

    /// No connection became available within the configured acquire bound.
    #[error("connection pool exhausted after {0:?}")]
    Exhausted(Duration),

    /// Operation attempted after pool teardown.
    #[error("connection pool is closed")]
    Closed,

    /// Connection establishment failed.
    #[error("database connection failed")]
    Connect(#[source] PgErr),

    /// Statement execution failed.
    #[error("query failed ({sql})")]
    Query {
        sql: String,
        #[source]
        source: PgErr,
    },

    /// Caller-contract violation: malformed limit shape, unknown attribute.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A single-row write affected a different number of rows.
    /// Only raised under strict write policy; permissive mode warns instead.
    #[error("write affected {0} rows where exactly one was expected")]
    RowCount(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
