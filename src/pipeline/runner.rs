//! Fan-out over database targets

use std::sync::Arc;

use super::errors::PipelineError;
use super::orchestrator::BatchOrchestrator;
use crate::answer_synthesis::AnswerSynthesizer;
use crate::graph_catalog::{discover_schema, SchemaCatalog};
use crate::graph_db::GraphConnector;
use crate::verification::DatasetRecord;

/// A database target whose batch was aborted
#[derive(Debug)]
pub struct TargetFailure {
    pub database: String,
    pub error: PipelineError,
}

/// Everything a run produced
#[derive(Debug, Default)]
pub struct DatasetRun {
    pub records: Vec<DatasetRecord>,
    pub failures: Vec<TargetFailure>,
}

impl DatasetRun {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct DatasetRunner {
    connector: Arc<dyn GraphConnector>,
    catalog: Arc<SchemaCatalog>,
    orchestrator: BatchOrchestrator,
    synthesizer: Option<AnswerSynthesizer>,
}

impl DatasetRunner {
    /// `catalog` must be the validator the orchestrator was built with, so that
    /// discovered schemas are what the schema gate checks against.
    pub fn new(
        connector: Arc<dyn GraphConnector>,
        catalog: Arc<SchemaCatalog>,
        orchestrator: BatchOrchestrator,
        synthesizer: Option<AnswerSynthesizer>,
    ) -> Self {
        Self {
            connector,
            catalog,
            orchestrator,
            synthesizer,
        }
    }

    /// Run every target in order. A failed target is recorded and the run moves on.
    pub async fn run(&self, databases: &[String]) -> DatasetRun {
        let mut run = DatasetRun::default();
        for database in databases {
            match self.run_target(database).await {
                Ok(records) => run.records.extend(records),
                Err(error) => {
                    log::error!("[{}] batch aborted: {}", database, error);
                    run.failures.push(TargetFailure {
                        database: database.clone(),
                        error,
                    });
                }
            }
        }
        run
    }

    async fn run_target(&self, database: &str) -> Result<Vec<DatasetRecord>, PipelineError> {
        let db = self.connector.connect(database).await?;
        let schema = discover_schema(db.as_ref(), database).await?;
        let schema = self.catalog.insert(database, schema);

        let records = self
            .orchestrator
            .run_database(db.as_ref(), database, &schema)
            .await?;

        match &self.synthesizer {
            Some(synthesizer) => Ok(synthesizer.synthesize(records).await?),
            None => Ok(records),
        }
    }
}
