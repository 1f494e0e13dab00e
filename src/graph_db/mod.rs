//! Graph database access
//!
//! Everything that talks to the graph under test goes through [`GraphDatabase`]:
//! schema introspection, path sampling and candidate execution. Rows come back as
//! ordered JSON maps keyed by the query's result aliases.

pub mod errors;
pub mod neo4j_client;

use std::sync::Arc;

use async_trait::async_trait;

pub use errors::GraphDbError;
pub use neo4j_client::{Neo4jConnector, Neo4jDatabase, Neo4jSettings};

/// One result row: result alias -> value, in projection order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Read-only query access to a graph database
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphDatabase: Send + Sync {
    /// Run `cypher` against `database` and collect every row.
    async fn query(&self, database: &str, cypher: &str) -> Result<Vec<Row>, GraphDbError>;
}

/// Opens a connection for one database target
#[async_trait]
pub trait GraphConnector: Send + Sync {
    async fn connect(&self, database: &str) -> Result<Arc<dyn GraphDatabase>, GraphDbError>;
}
