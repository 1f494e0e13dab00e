//! Natural-language answers for verified records
//!
//! Every validated record gets one model request built from its question, query and
//! result. Requests run concurrently; a semaphore caps how many are in flight.
//! Unvalidated records pass through untouched and cost no request.

use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::generation::prompts::answer_messages;
use crate::llm::{LanguageModel, LlmError};
use crate::verification::DatasetRecord;

pub const DEFAULT_MAX_CONCURRENT_ANSWERS: usize = 10;
pub const DEFAULT_ANSWER_MAX_TOKENS: u32 = 1024;

pub struct AnswerSynthesizer {
    model: Arc<dyn LanguageModel>,
    in_flight: Arc<Semaphore>,
    max_tokens: u32,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn LanguageModel>, max_concurrent: usize, max_tokens: u32) -> Self {
        Self {
            model,
            in_flight: Arc::new(Semaphore::new(max_concurrent.max(1))),
            max_tokens,
        }
    }

    /// Answer every validated record. Output order matches input order.
    ///
    /// Any failed request fails the whole call, after all in-flight requests
    /// have settled.
    pub async fn synthesize(&self, records: Vec<DatasetRecord>) -> Result<Vec<DatasetRecord>, LlmError> {
        let eligible = records.iter().filter(|r| r.validated).count();
        log::info!(
            "Generating answers for {} of {} records ({} concurrent)",
            eligible,
            records.len(),
            self.in_flight.available_permits()
        );

        let tasks = records.into_iter().map(|record| self.answer_one(record));
        let answered = join_all(tasks)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        log::info!("Answered {} records", answered.iter().filter(|r| r.answer.is_some()).count());
        Ok(answered)
    }

    async fn answer_one(&self, record: DatasetRecord) -> Result<DatasetRecord, LlmError> {
        if !record.validated {
            return Ok(record);
        }

        let result = Value::Array(
            record
                .result
                .iter()
                .flatten()
                .cloned()
                .map(Value::Object)
                .collect(),
        );
        let messages = answer_messages(&record.candidate.question, &record.candidate.cypher, &result);

        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| LlmError::AdmissionClosed)?;
        let answer = self.model.complete(&messages, self.max_tokens).await?;

        Ok(record.with_answer(answer.trim().to_string()))
    }
}
