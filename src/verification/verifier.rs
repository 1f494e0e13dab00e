//! Two-gate candidate verification
//!
//! Gate 1 is a static schema conformance check and must score exactly 1.0.
//! Gate 2 executes the query and requires exactly one row. A candidate that fails
//! Gate 1 is never executed. Execution errors end up in the [`Verification`]; they
//! never escape, so one bad candidate cannot abort a batch.

use std::sync::Arc;

use super::record::{VerifiedCandidate, Verification};
use crate::generation::Candidate;
use crate::graph_catalog::SchemaValidator;
use crate::graph_db::GraphDatabase;

pub struct CandidateVerifier<'a> {
    db: &'a dyn GraphDatabase,
    validator: Arc<dyn SchemaValidator>,
    database: &'a str,
}

impl<'a> CandidateVerifier<'a> {
    pub fn new(db: &'a dyn GraphDatabase, validator: Arc<dyn SchemaValidator>, database: &'a str) -> Self {
        Self {
            db,
            validator,
            database,
        }
    }

    pub async fn verify(&self, candidate: Candidate) -> VerifiedCandidate {
        let validation = self.validator.validate(&candidate.cypher, self.database);
        if !validation.is_conformant() {
            log::debug!(
                "[{}] schema gate rejected (score {:.2}): {} {:?}",
                self.database,
                validation.score,
                candidate.cypher,
                validation.diagnostics
            );
            return VerifiedCandidate {
                candidate,
                schema_score: Some(validation.score),
                verification: Verification::SchemaRejected {
                    score: validation.score,
                    diagnostics: validation.diagnostics,
                },
            };
        }

        let verification = match self.db.query(self.database, &candidate.cypher).await {
            Ok(rows) => Verification::from_rows(rows),
            Err(e) => {
                log::debug!(
                    "[{}] execution failed: {} ({})",
                    self.database,
                    candidate.cypher,
                    e
                );
                Verification::ExecutionFailed {
                    error: e.to_string(),
                }
            }
        };

        if let Some(failure) = verification.failure() {
            log::debug!("[{}] cardinality gate: {} for {}", self.database, failure, candidate.cypher);
        }

        VerifiedCandidate {
            candidate,
            schema_score: Some(validation.score),
            verification,
        }
    }

    /// Verify candidates one after another, in order.
    pub async fn verify_all(&self, candidates: Vec<Candidate>) -> Vec<VerifiedCandidate> {
        let mut verified = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            verified.push(self.verify(candidate).await);
        }
        verified
    }
}
