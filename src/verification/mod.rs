pub mod record;
pub mod verifier;

pub use record::{DatasetRecord, FailureKind, Verification, VerifiedCandidate};
pub use verifier::CandidateVerifier;
