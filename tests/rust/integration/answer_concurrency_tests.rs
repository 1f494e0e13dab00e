//! Bounded-concurrency answer synthesis

#[cfg(test)]
mod answer_concurrency_tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use cyphersynth::answer_synthesis::AnswerSynthesizer;
    use cyphersynth::generation::{Candidate, QueryType};
    use cyphersynth::verification::{DatasetRecord, Verification, VerifiedCandidate};
    use serde_json::json;
    use tokio_test::assert_ok;

    use crate::support::{row, FakeModel};

    fn record(index: usize, verification: Verification) -> DatasetRecord {
        DatasetRecord::from_verified(
            VerifiedCandidate {
                candidate: Candidate::new(
                    format!("Question {}?", index),
                    format!("MATCH (m:Movie) RETURN count(m) + {} AS n", index),
                    QueryType::Aggregation,
                ),
                schema_score: Some(1.0),
                verification,
            },
            "fake-model",
            "movies",
        )
    }

    /// 10 invalid records interleaved with 5 valid ones
    fn mixed_records() -> Vec<DatasetRecord> {
        (0..15)
            .map(|i| {
                if i % 3 == 0 {
                    record(i, Verification::Verified(row(json!({"n": i}))))
                } else {
                    record(i, Verification::Empty)
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_only_validated_records_are_answered_within_cap() {
        let model = Arc::new(FakeModel::answering_after(Duration::from_millis(20)));
        let synthesizer = AnswerSynthesizer::new(model.clone(), 3, 256);

        let records = mixed_records();
        let answered = assert_ok!(synthesizer.synthesize(records.clone()).await);

        assert_eq!(model.answer_calls.load(Ordering::SeqCst), 5);
        assert_eq!(model.max_in_flight.load(Ordering::SeqCst), 3);
        assert_eq!(model.generation_calls.load(Ordering::SeqCst), 0);

        assert_eq!(answered.len(), 15);
        for (before, after) in records.iter().zip(&answered) {
            assert_eq!(before.candidate, after.candidate);
            if before.validated {
                assert_eq!(after.answer.as_deref(), Some("Al Pacino played Vincent Hanna."));
            } else {
                assert_eq!(after, before);
            }
        }
    }

    #[tokio::test]
    async fn test_single_permit_serializes_requests() {
        let model = Arc::new(FakeModel::answering_after(Duration::from_millis(5)));
        let synthesizer = AnswerSynthesizer::new(model.clone(), 1, 256);

        assert_ok!(synthesizer.synthesize(mixed_records()).await);
        assert_eq!(model.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_cap_still_makes_progress() {
        let model = Arc::new(FakeModel::answering_after(Duration::ZERO));
        let synthesizer = AnswerSynthesizer::new(model.clone(), 0, 256);

        let answered = assert_ok!(synthesizer.synthesize(mixed_records()).await);
        assert_eq!(answered.iter().filter(|r| r.answer.is_some()).count(), 5);
    }

    #[tokio::test]
    async fn test_nothing_to_answer() {
        let model = Arc::new(FakeModel::default());
        let synthesizer = AnswerSynthesizer::new(model.clone(), 3, 256);

        let records: Vec<_> = (0..4).map(|i| record(i, Verification::Empty)).collect();
        let answered = assert_ok!(synthesizer.synthesize(records).await);

        assert_eq!(answered.len(), 4);
        assert_eq!(model.answer_calls.load(Ordering::SeqCst), 0);
    }
}
