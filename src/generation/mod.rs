//! Question/query generation
//!
//! Prompt construction, the model round trip, lenient recovery of the JSON payload
//! and promotion of each element into a typed [`Candidate`].

pub mod candidate;
pub mod complexity;
pub mod prompts;
pub mod requester;
pub mod response_parser;

pub use candidate::{parse_candidates, Candidate, NoiseType, ParsedBatch, QueryType, Rejection};
pub use complexity::Complexity;
pub use prompts::PromptMode;
pub use requester::{GenerationRequester, DEFAULT_GENERATION_MAX_TOKENS};
pub use response_parser::{extract_json_from_markdown, lenient_parse};
