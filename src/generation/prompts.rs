//! Prompt text for question generation and answer synthesis

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::llm::ChatMessage;

/// Which question mix to ask the model for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptMode {
    /// 2-4 hop questions: aggregation, property retrieval, sorting, existence
    #[default]
    MultiHop,
    /// 0-2 hop questions: direct lookups, single-hop and two-hop retrieval
    Simple,
}

impl PromptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::MultiHop => "multi-hop",
            PromptMode::Simple => "simple",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            PromptMode::MultiHop => MULTI_HOP_SYSTEM_PROMPT.as_str(),
            PromptMode::Simple => SIMPLE_SYSTEM_PROMPT.as_str(),
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown prompt mode `{0}` (expected `multi-hop` or `simple`)")]
pub struct ParsePromptModeError(pub String);

impl FromStr for PromptMode {
    type Err = ParsePromptModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "multi-hop" | "multihop" => Ok(PromptMode::MultiHop),
            "simple" => Ok(PromptMode::Simple),
            _ => Err(ParsePromptModeError(s.to_string())),
        }
    }
}

const SHARED_RULES: &str = r#"## Input
1. A graph schema listing node labels with typed properties, relationship types with
   typed properties, and the (:Label)-[:TYPE]->(:Label) patterns present in the data.
2. Sample paths taken from the live graph: path length, the nodes (labels + properties)
   and relationships (type + properties) along each path, and a path signature.

## Query rules
- Every query must return exactly ONE row with ONE column.
- Give the returned column a meaningful alias with `AS` (e.g. `count(DISTINCT m) AS movie_count`).
- Only use labels, relationship types and properties that appear in the schema, in the
  directions the schema lists.
- Anchor questions on real entities and values from the sample paths.
- Avoid queries that would always return 0 or null.
- Read-only Cypher only.

## Noise
Apply noise to about 40% of questions and record it:
- typo: a small misspelling of a named entity ("Tom Henks")
- colloquialism: informal wording ("flicks", "folks", "team up with")
- grammatical: contractions or small grammar slips ("What's", "actorss")
- slang: domain jargon ("A-lister", "startup", "buddy")

## Complexity
Count relationship traversals in the pattern, regardless of arrow direction:
0-hop, 1-hop, 2-hop, 3-hop, 4-hop or 5+hop.

## Output format
Reason about the schema and paths inside <reasoning> tags first, then return a JSON
array in a ```json block. Each element:
{
  "question": "...",
  "cypher": "...",
  "query_type": "...",
  "complexity": "2-hop",
  "noise_applied": true,
  "noise_type": "typo"
}
Omit "noise_type" when "noise_applied" is false."#;

const MULTI_HOP_SYSTEM_PROMPT_HEAD: &str = r#"You generate a text-to-Cypher evaluation dataset. Write 50 natural-language
questions, each paired with a Cypher query that answers it with a single value.

## Focus
- Questions need 2 to 4 relationship traversals along meaningful paths.
- Spread them roughly evenly over these query types, favouring what is natural for
  the domain over an exact split:
  - Aggregation (count, sum, avg, max, min)
  - Property Retrieval (one property of the end node)
  - Sorting (ORDER BY ... LIMIT 1, or max/min)
  - Existence Verification (path counts, shortest path length, connecting entities)
- Vary phrasing: questions, requests, statements. Always name entities explicitly.
"#;

const SIMPLE_SYSTEM_PROMPT_HEAD: &str = r#"You generate a text-to-Cypher evaluation dataset. Write 50 natural-language
questions, each paired with a Cypher query that answers it with a single value.

## Focus
- Questions need 0 to 2 relationship traversals: the everyday questions users ask.
- Spread them roughly evenly over these query types, favouring what is natural for
  the domain over an exact split:
  - Direct Property Access (0 hops, one property of one node)
  - Single-hop Aggregation (count, sum, avg, max, min over one relationship)
  - Single-hop Property Retrieval (a property reached through one relationship)
  - Two-hop Property Retrieval (a property reached through two relationships)
- Vary phrasing: questions, requests, statements. Always name entities explicitly.
"#;

lazy_static::lazy_static! {
    static ref MULTI_HOP_SYSTEM_PROMPT: String =
        format!("{}\n{}", MULTI_HOP_SYSTEM_PROMPT_HEAD, SHARED_RULES);
    static ref SIMPLE_SYSTEM_PROMPT: String =
        format!("{}\n{}", SIMPLE_SYSTEM_PROMPT_HEAD, SHARED_RULES);
}

const ANSWER_SYSTEM_PROMPT: &str = "You answer questions using data from a Neo4j database. \
Given a natural-language question, the Cypher query used to answer it and the query result, \
return a concise, accurate answer based only on the result.";

/// Formatted prompt ready to send to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationPrompt {
    pub system_prompt: String,
    pub user_prompt: String,
    pub estimated_tokens: usize,
}

impl GenerationPrompt {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(self.user_prompt.clone()),
        ]
    }
}

/// Build the generation prompt from the schema description and sampled paths.
pub fn generation_prompt(mode: PromptMode, schema: &str, paths: &Value) -> GenerationPrompt {
    let rendered_paths =
        serde_json::to_string_pretty(paths).unwrap_or_else(|_| paths.to_string());
    let user_prompt = format!("Graph schema:\n{}\n\nSample paths:\n{}\n", schema, rendered_paths);
    let system_prompt = mode.system_prompt().to_string();
    let estimated_tokens = (system_prompt.len() + user_prompt.len()) / 4;

    GenerationPrompt {
        system_prompt,
        user_prompt,
        estimated_tokens,
    }
}

/// Messages asking for a short answer to a verified question.
pub fn answer_messages(question: &str, cypher: &str, result: &Value) -> Vec<ChatMessage> {
    let user_prompt = format!(
        "Question: {}\nCypher Query: {}\nQuery Result: {}\n\n\
         Provide a concise answer to the question using only the query result.\n\
         If the provided data isn't related to the question, answer 'UNKNOWN'.",
        question, cypher, result
    );
    vec![
        ChatMessage::system(ANSWER_SYSTEM_PROMPT),
        ChatMessage::user(user_prompt),
    ]
}
