//! Per-database generate-and-verify loop

use std::sync::Arc;

use super::errors::PipelineError;
use crate::generation::{GenerationRequester, PromptMode, DEFAULT_GENERATION_MAX_TOKENS};
use crate::graph_catalog::{GraphSchema, SchemaValidator};
use crate::graph_db::GraphDatabase;
use crate::llm::LanguageModel;
use crate::sampling::{sample_paths, DEFAULT_MAX_LIST_LEN, DEFAULT_PATH_SAMPLE_CAP};
use crate::verification::{CandidateVerifier, DatasetRecord};

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub iterations: usize,
    pub generation_max_tokens: u32,
    pub prompt_mode: PromptMode,
    pub path_sample_cap: usize,
    pub max_list_len: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            iterations: 1,
            generation_max_tokens: DEFAULT_GENERATION_MAX_TOKENS,
            prompt_mode: PromptMode::default(),
            path_sample_cap: DEFAULT_PATH_SAMPLE_CAP,
            max_list_len: DEFAULT_MAX_LIST_LEN,
        }
    }
}

pub struct BatchOrchestrator {
    generator: Arc<dyn LanguageModel>,
    validator: Arc<dyn SchemaValidator>,
    settings: BatchSettings,
}

impl BatchOrchestrator {
    pub fn new(
        generator: Arc<dyn LanguageModel>,
        validator: Arc<dyn SchemaValidator>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            generator,
            validator,
            settings,
        }
    }

    /// Run every iteration for one database, strictly in order.
    ///
    /// Each iteration samples fresh paths, generates, then verifies every candidate.
    /// Record-level failures stay in the records; anything else (connection loss,
    /// model API failure) aborts the batch and is returned.
    pub async fn run_database(
        &self,
        db: &dyn GraphDatabase,
        database: &str,
        schema: &GraphSchema,
    ) -> Result<Vec<DatasetRecord>, PipelineError> {
        let requester = GenerationRequester::new(
            self.generator.as_ref(),
            self.settings.prompt_mode,
            self.settings.generation_max_tokens,
        );
        let verifier = CandidateVerifier::new(db, Arc::clone(&self.validator), database);
        let model = requester.model_id();
        let schema_text = schema.describe();

        let mut records = Vec::new();
        for iteration in 1..=self.settings.iterations {
            let paths = sample_paths(
                db,
                database,
                self.settings.path_sample_cap,
                self.settings.max_list_len,
            )
            .await?;

            let batch = requester.generate(&schema_text, &paths).await?;
            let generated = batch.candidates.len();

            let verified = verifier.verify_all(batch.candidates).await;
            let validated = verified.iter().filter(|v| v.verification.is_verified()).count();
            records.extend(
                verified
                    .into_iter()
                    .map(|v| DatasetRecord::from_verified(v, &model, database)),
            );

            log::info!(
                "[{}] iteration {}/{}: {} generated, {} validated, {} unparseable",
                database,
                iteration,
                self.settings.iterations,
                generated,
                validated,
                batch.rejected.len()
            );
        }

        Ok(records)
    }
}
