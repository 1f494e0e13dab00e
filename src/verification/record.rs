use serde::{Deserialize, Serialize};
use std::fmt;

use crate::generation::Candidate;
use crate::graph_db::Row;

/// Outcome of running a candidate through both gates
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// Gate 1 failed; the query was never executed
    SchemaRejected { score: f64, diagnostics: Vec<String> },
    /// Gate 2: execution raised an error or timed out
    ExecutionFailed { error: String },
    /// Gate 2: no rows
    Empty,
    /// Gate 2: more than one row
    MultipleRows(Vec<Row>),
    /// Exactly one row
    Verified(Row),
}

impl Verification {
    /// Classify the rows of a successful execution by cardinality.
    pub fn from_rows(mut rows: Vec<Row>) -> Self {
        match rows.len() {
            0 => Verification::Empty,
            1 => Verification::Verified(rows.remove(0)),
            _ => Verification::MultipleRows(rows),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified(_))
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            Verification::SchemaRejected { .. } => Some(FailureKind::SchemaNonconformant),
            Verification::ExecutionFailed { .. } => Some(FailureKind::ExecutionError),
            Verification::Empty => Some(FailureKind::EmptyResult),
            Verification::MultipleRows(_) => Some(FailureKind::MultipleRows),
            Verification::Verified(_) => None,
        }
    }

    /// Rows to record as `result`: whatever a successful execution returned.
    pub fn result_rows(&self) -> Option<Vec<Row>> {
        match self {
            Verification::Verified(row) => Some(vec![row.clone()]),
            Verification::MultipleRows(rows) => Some(rows.clone()),
            Verification::Empty => Some(Vec::new()),
            Verification::SchemaRejected { .. } | Verification::ExecutionFailed { .. } => None,
        }
    }
}

/// Why a record is not validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SchemaNonconformant,
    ExecutionError,
    EmptyResult,
    MultipleRows,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::SchemaNonconformant => "schema_nonconformant",
            FailureKind::ExecutionError => "execution_error",
            FailureKind::EmptyResult => "empty_result",
            FailureKind::MultipleRows => "multiple_rows",
        };
        f.write_str(name)
    }
}

/// A candidate together with its gate outcome
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedCandidate {
    pub candidate: Candidate,
    pub schema_score: Option<f64>,
    pub verification: Verification,
}

/// One line of the output dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub model: String,
    pub database: String,
    pub validated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<Row>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl DatasetRecord {
    pub fn from_verified(verified: VerifiedCandidate, model: &str, database: &str) -> Self {
        let VerifiedCandidate {
            candidate,
            schema_score,
            verification,
        } = verified;

        Self {
            candidate,
            model: model.to_string(),
            database: database.to_string(),
            validated: verification.is_verified(),
            result: verification.result_rows(),
            schema_score,
            failure: verification.failure(),
            answer: None,
        }
    }

    /// Attach an answer. Unvalidated records never carry one.
    pub fn with_answer(mut self, answer: String) -> Self {
        if self.validated {
            self.answer = Some(answer);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::QueryType;
    use serde_json::json;

    fn row(key: &str, value: serde_json::Value) -> Row {
        let mut row = Row::new();
        row.insert(key.to_string(), value);
        row
    }

    fn record(verification: Verification) -> DatasetRecord {
        DatasetRecord::from_verified(
            VerifiedCandidate {
                candidate: Candidate::new("q", "MATCH (m:Movie) RETURN count(m) AS n", QueryType::Aggregation),
                schema_score: Some(1.0),
                verification,
            },
            "claude",
            "movies",
        )
    }

    #[test]
    fn test_from_rows_cardinality() {
        assert_eq!(Verification::from_rows(vec![]), Verification::Empty);
        assert!(Verification::from_rows(vec![row("n", json!(1))]).is_verified());
        assert!(matches!(
            Verification::from_rows(vec![row("n", json!(1)), row("n", json!(2))]),
            Verification::MultipleRows(rows) if rows.len() == 2
        ));
    }

    #[test]
    fn test_verified_record() {
        let record = record(Verification::Verified(row("n", json!(38))));
        assert!(record.validated);
        assert_eq!(record.result, Some(vec![row("n", json!(38))]));
        assert_eq!(record.failure, None);
    }

    #[test]
    fn test_multiple_rows_keep_result() {
        let record = record(Verification::MultipleRows(vec![row("n", json!(1)), row("n", json!(2))]));
        assert!(!record.validated);
        assert_eq!(record.result.as_ref().map(Vec::len), Some(2));
        assert_eq!(record.failure, Some(FailureKind::MultipleRows));
    }

    #[test]
    fn test_execution_failure_has_no_result() {
        let record = record(Verification::ExecutionFailed {
            error: "SyntaxError".to_string(),
        });
        assert!(!record.validated);
        assert_eq!(record.result, None);
        assert_eq!(record.failure, Some(FailureKind::ExecutionError));
    }

    #[test]
    fn test_answer_only_on_validated() {
        let rejected = record(Verification::SchemaRejected {
            score: 0.5,
            diagnostics: vec![],
        })
        .with_answer("42".to_string());
        assert_eq!(rejected.answer, None);

        let verified = record(Verification::Verified(row("n", json!(42)))).with_answer("42".to_string());
        assert_eq!(verified.answer.as_deref(), Some("42"));
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(record(Verification::ExecutionFailed {
            error: "boom".to_string(),
        }))
        .unwrap();

        assert_eq!(value["question"], "q");
        assert_eq!(value["complexity"], "0-hop");
        assert_eq!(value["model"], "claude");
        assert_eq!(value["database"], "movies");
        assert_eq!(value["validated"], false);
        assert_eq!(value["failure"], "execution_error");
        assert!(value.get("result").is_none());
        assert!(value.get("answer").is_none());
    }
}
