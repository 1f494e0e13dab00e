use thiserror::Error;

use crate::graph_catalog::GraphCatalogError;
use crate::graph_db::GraphDbError;
use crate::llm::LlmError;

/// Errors that abort a database batch
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Graph(#[from] GraphDbError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Catalog(#[from] GraphCatalogError),
    #[error("Failed to write dataset to {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize dataset: {0}")]
    Serialize(#[from] serde_json::Error),
}
