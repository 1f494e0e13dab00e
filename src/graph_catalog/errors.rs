use thiserror::Error;

use crate::graph_db::GraphDbError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphCatalogError {
    #[error("Schema introspection failed for database `{database}`: {source}")]
    Introspection {
        database: String,
        #[source]
        source: GraphDbError,
    },
    #[error("Database `{database}` has no node labels; nothing to generate questions about")]
    EmptySchema { database: String },
}
