use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphDbError {
    #[error("Failed to connect to `{uri}` (database `{database}`): {message}")]
    Connection {
        uri: String,
        database: String,
        message: String,
    },
    #[error("Query failed: {0}")]
    Query(String),
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),
    #[error("Failed to decode result row: {0}")]
    RowDecode(String),
    #[error("Connection is bound to database `{bound}`, cannot query `{requested}`")]
    DatabaseMismatch { bound: String, requested: String },
}

impl From<neo4rs::Error> for GraphDbError {
    fn from(err: neo4rs::Error) -> Self {
        GraphDbError::Query(err.to_string())
    }
}
