use thiserror::Error;

/// Failures that can occur inside a serialized task.
///
/// Never crosses the gateway boundary: every public operation converts a
/// `GatewayError` into its sentinel return value and a side-channel event.
#[derive(Debug, Error)]
pub(crate) enum GatewayError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    TransactionState(&'static str),

    #[error("column names and values must pair up as two-element [name, value] lists")]
    MalformedPairs,
}

impl GatewayError {
    /// Engine failures (and malformed bulk input, which is reported the same
    /// way) produce a `SqlError` event; everything else is debug-only.
    pub(crate) fn is_sql_error(&self) -> bool {
        matches!(self, GatewayError::Sqlite(_) | GatewayError::MalformedPairs)
    }
}
