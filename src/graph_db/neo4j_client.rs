use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph};

use super::{GraphConnector, GraphDatabase, GraphDbError, Row};

/// Connection settings shared by every database target
#[derive(Debug, Clone)]
pub struct Neo4jSettings {
    pub uri: String,
    /// Falls back to the database name (demo-server convention) when unset
    pub user: Option<String>,
    /// Falls back to the database name (demo-server convention) when unset
    pub password: Option<String>,
    pub query_timeout: Duration,
    pub fetch_size: usize,
}

impl Neo4jSettings {
    fn credentials_for(&self, database: &str) -> (String, String) {
        (
            self.user.clone().unwrap_or_else(|| database.to_string()),
            self.password.clone().unwrap_or_else(|| database.to_string()),
        )
    }
}

/// A Bolt connection bound to a single database
pub struct Neo4jDatabase {
    graph: Graph,
    database: String,
    query_timeout: Duration,
}

impl Neo4jDatabase {
    pub async fn connect(settings: &Neo4jSettings, database: &str) -> Result<Self, GraphDbError> {
        let (user, password) = settings.credentials_for(database);
        let connection_error = |message: String| GraphDbError::Connection {
            uri: settings.uri.clone(),
            database: database.to_string(),
            message,
        };

        log::info!(
            "Connecting to {} as `{}` (database `{}`)",
            settings.uri,
            user,
            database
        );

        let config = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(user.as_str())
            .password(password.as_str())
            .db(database)
            .fetch_size(settings.fetch_size)
            .build()
            .map_err(|e| connection_error(e.to_string()))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| connection_error(e.to_string()))?;

        Ok(Self {
            graph,
            database: database.to_string(),
            query_timeout: settings.query_timeout,
        })
    }

    async fn fetch_rows(&self, cypher: &str) -> Result<Vec<Row>, GraphDbError> {
        let mut stream = self.graph.execute(query(cypher)).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            let decoded = row
                .to::<Row>()
                .map_err(|e| GraphDbError::RowDecode(e.to_string()))?;
            rows.push(decoded);
        }
        Ok(rows)
    }
}

#[async_trait]
impl GraphDatabase for Neo4jDatabase {
    async fn query(&self, database: &str, cypher: &str) -> Result<Vec<Row>, GraphDbError> {
        if database != self.database {
            return Err(GraphDbError::DatabaseMismatch {
                bound: self.database.clone(),
                requested: database.to_string(),
            });
        }

        log::debug!("[{}] executing: {}", database, cypher);
        tokio::time::timeout(self.query_timeout, self.fetch_rows(cypher))
            .await
            .map_err(|_| GraphDbError::Timeout(self.query_timeout))?
    }
}

/// Opens one [`Neo4jDatabase`] per target with shared settings
#[derive(Debug, Clone)]
pub struct Neo4jConnector {
    settings: Neo4jSettings,
}

impl Neo4jConnector {
    pub fn new(settings: Neo4jSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl GraphConnector for Neo4jConnector {
    async fn connect(&self, database: &str) -> Result<Arc<dyn GraphDatabase>, GraphDbError> {
        let db = Neo4jDatabase::connect(&self.settings, database).await?;
        Ok(Arc::new(db))
    }
}
