//! Mapping from sqlx errors to the dashboard error taxonomy.

use dashboard_core::{ConflictCode, Error, NotFoundCode};
use telemetry::health;
use tracing::{error, warn};

/// Classify a driver error. Connectivity problems also mark the store unhealthy.
pub fn map_sqlx_error(op: &'static str, err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            warn!(op, constraint = ?db.constraint(), "unique violation");
            Error::conflict(
                ConflictCode::ConcurrentOverride,
                format!("{}: concurrent modification detected", op),
            )
        }
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            warn!(op, constraint = ?db.constraint(), "foreign key violation");
            Error::not_found(
                NotFoundCode::Campaign,
                format!("{}: referenced campaign does not exist", op),
            )
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => {
            error!(op, error = %err, "Postgres unreachable");
            health().postgres.set_unhealthy(err.to_string());
            Error::unavailable(format!("{}: classification store unreachable", op))
        }
        sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => {
            error!(op, error = %err, "Postgres row decode failed");
            Error::internal(format!("{}: {}", op, err))
        }
        other => {
            error!(op, error = %other, "Postgres query failed");
            Error::unavailable(format!("{}: query failed", op))
        }
    }
}
