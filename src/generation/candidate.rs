//! Typed candidate records
//!
//! Model output is loosely structured. Every parsed element goes through
//! [`RawCandidate`] (everything optional, any shape tolerated) and is then either
//! promoted to a [`Candidate`] or rejected with a reason.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::complexity::Complexity;

/// Kind of question a candidate asks
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueryType {
    Aggregation,
    PropertyRetrieval,
    Sorting,
    ExistenceVerification,
    DirectPropertyAccess,
    SingleHopAggregation,
    SingleHopPropertyRetrieval,
    TwoHopPropertyRetrieval,
    /// Anything else the model came up with, kept verbatim
    Other(String),
}

impl QueryType {
    const KNOWN: [QueryType; 8] = [
        QueryType::Aggregation,
        QueryType::PropertyRetrieval,
        QueryType::Sorting,
        QueryType::ExistenceVerification,
        QueryType::DirectPropertyAccess,
        QueryType::SingleHopAggregation,
        QueryType::SingleHopPropertyRetrieval,
        QueryType::TwoHopPropertyRetrieval,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            QueryType::Aggregation => "Aggregation",
            QueryType::PropertyRetrieval => "Property Retrieval",
            QueryType::Sorting => "Sorting",
            QueryType::ExistenceVerification => "Existence Verification",
            QueryType::DirectPropertyAccess => "Direct Property Access",
            QueryType::SingleHopAggregation => "Single-hop Aggregation",
            QueryType::SingleHopPropertyRetrieval => "Single-hop Property Retrieval",
            QueryType::TwoHopPropertyRetrieval => "Two-hop Property Retrieval",
            QueryType::Other(name) => name,
        }
    }
}

fn squash(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl From<String> for QueryType {
    /// Case, spacing and punctuation are ignored: `property_retrieval`,
    /// `Property Retrieval` and `PropertyRetrieval` are the same type.
    fn from(value: String) -> Self {
        let key = squash(&value);
        QueryType::KNOWN
            .iter()
            .find(|known| squash(known.as_str()) == key)
            .cloned()
            .unwrap_or_else(|| QueryType::Other(value.trim().to_string()))
    }
}

impl From<QueryType> for String {
    fn from(value: QueryType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of noise injected into a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseType {
    Typo,
    Colloquialism,
    Grammatical,
    Slang,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown noise type `{0}`")]
pub struct ParseNoiseTypeError(pub String);

impl FromStr for NoiseType {
    type Err = ParseNoiseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "typo" | "typos" | "spelling" => Ok(NoiseType::Typo),
            "colloquialism" | "colloquial" | "colloquialisms" => Ok(NoiseType::Colloquialism),
            "grammatical" | "grammar" | "grammaticalerror" => Ok(NoiseType::Grammatical),
            "slang" => Ok(NoiseType::Slang),
            _ => Err(ParseNoiseTypeError(s.to_string())),
        }
    }
}

/// One parsed element of a generation response, before any checks
#[derive(Debug, Default, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, alias = "query")]
    pub cypher: Option<String>,
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(default)]
    pub complexity: Option<Value>,
    #[serde(default)]
    pub noise_applied: Option<Value>,
    #[serde(default)]
    pub noise_type: Option<String>,
}

/// A question/query pair ready for verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub question: String,
    pub cypher: String,
    pub query_type: QueryType,
    /// Always derived from `cypher`
    pub complexity: Complexity,
    /// What the model claimed, when it disagrees with `complexity`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_complexity: Option<String>,
    pub noise_applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_type: Option<NoiseType>,
}

impl Candidate {
    pub fn new(question: impl Into<String>, cypher: impl Into<String>, query_type: QueryType) -> Self {
        let cypher = cypher.into();
        Self {
            question: question.into(),
            complexity: Complexity::of_query(&cypher),
            cypher,
            query_type,
            declared_complexity: None,
            noise_applied: false,
            noise_type: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Malformed,
    MissingQuestion,
    MissingCypher,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Malformed => write!(f, "element is not a candidate object"),
            Rejection::MissingQuestion => write!(f, "missing or empty `question`"),
            Rejection::MissingCypher => write!(f, "missing or empty `cypher`"),
        }
    }
}

impl TryFrom<RawCandidate> for Candidate {
    type Error = Rejection;

    fn try_from(raw: RawCandidate) -> Result<Self, Self::Error> {
        let question = non_empty(raw.question).ok_or(Rejection::MissingQuestion)?;
        let cypher = non_empty(raw.cypher).ok_or(Rejection::MissingCypher)?;

        let complexity = Complexity::of_query(&cypher);
        let declared_complexity = raw
            .complexity
            .as_ref()
            .and_then(value_text)
            .filter(|declared| declared.parse::<Complexity>().ok() != Some(complexity));
        if let Some(declared) = &declared_complexity {
            log::debug!(
                "declared complexity `{}` disagrees with counted `{}` for: {}",
                declared,
                complexity,
                cypher
            );
        }

        let noise_applied = raw.noise_applied.as_ref().is_some_and(truthy);
        let noise_type = match raw.noise_type.as_deref() {
            Some(text) if noise_applied => match text.parse::<NoiseType>() {
                Ok(noise_type) => Some(noise_type),
                Err(e) => {
                    log::warn!("dropping noise_type: {}", e);
                    None
                }
            },
            _ => None,
        };

        Ok(Candidate {
            question,
            cypher,
            query_type: raw
                .query_type
                .and_then(|text| non_empty(Some(text)))
                .map(QueryType::from)
                .unwrap_or_else(|| QueryType::Other("Unspecified".to_string())),
            complexity,
            declared_complexity,
            noise_applied,
            noise_type,
        })
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format!("{}-hop", n)),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

/// Candidates recovered from one generation response
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub candidates: Vec<Candidate>,
    pub rejected: Vec<Rejection>,
}

impl ParsedBatch {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Promote a leniently parsed response into typed candidates.
///
/// Accepts an array of records, a single record, or an object wrapping the array
/// under some key (`{"questions": [...]}`).
pub fn parse_candidates(value: Value) -> ParsedBatch {
    let elements = match value {
        Value::Array(items) => items,
        Value::Object(map) if is_record(&map) => vec![Value::Object(map)],
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let mut batch = ParsedBatch::default();
    for element in elements {
        let outcome = match element {
            Value::Object(_) => serde_json::from_value::<RawCandidate>(element)
                .map_err(|_| Rejection::Malformed)
                .and_then(Candidate::try_from),
            _ => Err(Rejection::Malformed),
        };
        match outcome {
            Ok(candidate) => batch.candidates.push(candidate),
            Err(rejection) => {
                log::debug!("rejected generated element: {}", rejection);
                batch.rejected.push(rejection);
            }
        }
    }
    batch
}

fn is_record(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("question") || map.contains_key("cypher") || map.contains_key("query")
}
