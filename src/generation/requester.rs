use serde_json::Value;

use super::candidate::{parse_candidates, ParsedBatch};
use super::prompts::{generation_prompt, PromptMode};
use super::response_parser::extract_json_from_markdown;
use crate::llm::{LanguageModel, LlmError};

/// Generation budget for one response of ~50 records with reasoning
pub const DEFAULT_GENERATION_MAX_TOKENS: u32 = 25_000;

/// Turns a schema description and sampled paths into candidate records
pub struct GenerationRequester<'a> {
    model: &'a dyn LanguageModel,
    mode: PromptMode,
    max_tokens: u32,
}

impl<'a> GenerationRequester<'a> {
    pub fn new(model: &'a dyn LanguageModel, mode: PromptMode, max_tokens: u32) -> Self {
        Self {
            model,
            mode,
            max_tokens,
        }
    }

    pub fn model_id(&self) -> String {
        self.model.model_id()
    }

    /// One model round trip.
    ///
    /// Model failures are errors. An unparseable response is not: it yields an
    /// empty batch, which the caller treats as "nothing generated this round".
    pub async fn generate(&self, schema: &str, paths: &Value) -> Result<ParsedBatch, LlmError> {
        let prompt = generation_prompt(self.mode, schema, paths);
        log::debug!(
            "requesting {} generation (~{} prompt tokens, budget {})",
            self.mode,
            prompt.estimated_tokens,
            self.max_tokens
        );

        let response = self.model.complete(&prompt.messages(), self.max_tokens).await?;

        match extract_json_from_markdown(&response) {
            Some(value) => Ok(parse_candidates(value)),
            None => {
                log::warn!(
                    "no JSON payload in generation response ({} chars); skipping round",
                    response.len()
                );
                Ok(ParsedBatch::default())
            }
        }
    }
}
