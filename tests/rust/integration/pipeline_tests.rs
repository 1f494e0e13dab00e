//! End-to-end batch runs: discovery, generation, both verification gates,
//! answers and per-target failure collection

#[cfg(test)]
mod pipeline_tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use cyphersynth::answer_synthesis::AnswerSynthesizer;
    use cyphersynth::generation::Complexity;
    use cyphersynth::graph_catalog::{discover_schema, SchemaCatalog};
    use cyphersynth::pipeline::{BatchOrchestrator, BatchSettings, DatasetRunner, PipelineError};
    use cyphersynth::verification::FailureKind;
    use serde_json::json;
    use tokio_test::assert_ok;

    use crate::support::{FakeConnector, FakeGraph, FakeModel};

    const LOOKUP: &str = "MATCH (m:Movie {title: 'Heat'}) RETURN m.released AS released";
    const UNKNOWN_LABEL: &str = "MATCH (c:Company) RETURN count(c) AS companies";
    const CAST: &str = "MATCH (p:Person)-[:ACTED_IN]->(m:Movie {title: 'Heat'}) RETURN p.name AS name";
    const BROKEN: &str = "MATCH (m:Movie) RETURN m.title AS title ORDER BY m.released LIMIT 1";

    fn generation_response() -> String {
        format!(
            "Looking at the sample paths, here are some questions.\n```json\n{}\n```",
            json!([
                {"question": "When was Heat released?", "cypher": LOOKUP, "query_type": "Property Retrieval", "complexity": "0-hop", "noise_applied": false},
                {"question": "How many companies are there?", "cypher": UNKNOWN_LABEL, "query_type": "Aggregation", "complexity": "0-hop", "noise_applied": false},
                {"question": "Who acted in Heat?", "cypher": CAST, "query_type": "Relationship Traversal", "complexity": "2-hop", "noise_applied": true, "noise_type": "typo"},
                {"question": "What is the earliest movie?", "cypher": BROKEN, "query_type": "Sorting", "complexity": "0-hop", "noise_applied": false},
            ])
        )
    }

    fn movies_graph() -> Arc<FakeGraph> {
        Arc::new(
            FakeGraph::movies()
                .respond(LOOKUP, vec![json!({"released": 1995})])
                .respond(CAST, vec![json!({"name": "Al Pacino"}), json!({"name": "Robert De Niro"})])
                .fail(BROKEN, "Neo.ClientError.Statement.SyntaxError"),
        )
    }

    fn runner(
        connector: FakeConnector,
        generator: Arc<FakeModel>,
        answerer: Option<Arc<FakeModel>>,
        iterations: usize,
    ) -> DatasetRunner {
        let catalog = Arc::new(SchemaCatalog::new());
        let orchestrator = BatchOrchestrator::new(
            generator,
            catalog.clone(),
            BatchSettings {
                iterations,
                ..BatchSettings::default()
            },
        );
        let synthesizer = answerer.map(|model| AnswerSynthesizer::new(model, 3, 256));
        DatasetRunner::new(Arc::new(connector), catalog, orchestrator, synthesizer)
    }

    #[tokio::test]
    async fn test_discovered_schema_drives_prompt_and_gate() {
        let graph = movies_graph();
        let schema = assert_ok!(discover_schema(graph.as_ref(), "movies").await);

        assert!(schema.label_has_property("Movie", "released"));
        assert!(schema.has_pattern("Person", "ACTED_IN", "Movie"));
        let text = schema.describe();
        assert!(text.contains("Movie {"));
        assert!(text.contains("(:Person)-[:ACTED_IN]->(:Movie)"));
    }

    #[tokio::test]
    async fn test_batch_outcomes_per_gate() {
        let graph = movies_graph();
        let generator = Arc::new(FakeModel::generating(&[&generation_response()]));
        let runner = runner(
            FakeConnector::default().with("movies", graph.clone()),
            generator.clone(),
            None,
            1,
        );

        let run = runner.run(&["movies".to_string()]).await;
        assert!(run.is_complete());
        assert_eq!(run.records.len(), 4);
        assert!(run
            .records
            .iter()
            .all(|r| r.model == "fake-model" && r.database == "movies" && r.answer.is_none()));

        // single-row lookup passes both gates
        let lookup = &run.records[0];
        assert!(lookup.validated);
        assert_eq!(lookup.candidate.complexity, Complexity::ZeroHop);
        assert_eq!(lookup.result, Some(vec![crate::support::row(json!({"released": 1995}))]));
        assert_eq!(lookup.schema_score, Some(1.0));

        // unknown label is stopped before execution
        let unknown = &run.records[1];
        assert!(!unknown.validated);
        assert_eq!(unknown.failure, Some(FailureKind::SchemaNonconformant));
        assert!(unknown.schema_score.unwrap() < 1.0);
        assert!(unknown.result.is_none());
        assert_eq!(graph.executions_of(UNKNOWN_LABEL), 0);

        // two rows fail the cardinality gate but keep their result
        let cast = &run.records[2];
        assert!(!cast.validated);
        assert_eq!(cast.failure, Some(FailureKind::MultipleRows));
        assert_eq!(cast.result.as_ref().map(Vec::len), Some(2));
        assert_eq!(cast.candidate.complexity, Complexity::OneHop);
        assert_eq!(cast.candidate.declared_complexity.as_deref(), Some("2-hop"));

        // execution error is recorded and the batch carries on
        let broken = &run.records[3];
        assert!(!broken.validated);
        assert_eq!(broken.failure, Some(FailureKind::ExecutionError));
        assert!(broken.result.is_none());
        assert_eq!(graph.executions_of(BROKEN), 1);

        assert_eq!(generator.generation_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_iterations_resample_and_regenerate() {
        let graph = movies_graph();
        let response = generation_response();
        let generator = Arc::new(FakeModel::generating(&[&response, &response, &response]));
        let runner = runner(
            FakeConnector::default().with("movies", graph.clone()),
            generator.clone(),
            None,
            3,
        );

        let run = runner.run(&["movies".to_string()]).await;
        assert!(run.is_complete());
        assert_eq!(run.records.len(), 12);
        assert_eq!(run.records.iter().filter(|r| r.validated).count(), 3);
        assert_eq!(generator.generation_calls.load(Ordering::SeqCst), 3);
        assert_eq!(graph.executions_of(LOOKUP), 3);
    }

    #[tokio::test]
    async fn test_answers_only_for_validated_records() {
        let generator = Arc::new(FakeModel::generating(&[&generation_response()]));
        let answerer = Arc::new(FakeModel::default());
        let runner = runner(
            FakeConnector::default().with("movies", movies_graph()),
            generator,
            Some(answerer.clone()),
            1,
        );

        let run = runner.run(&["movies".to_string()]).await;
        assert!(run.is_complete());
        assert_eq!(answerer.answer_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            run.records[0].answer.as_deref(),
            Some("Al Pacino played Vincent Hanna.")
        );
        assert!(run.records[1..].iter().all(|r| r.answer.is_none()));
    }

    #[tokio::test]
    async fn test_failed_targets_are_collected() {
        let response = generation_response();
        let generator = Arc::new(FakeModel::generating(&[&response, &response]));
        let connector = FakeConnector::default()
            .with("movies", movies_graph())
            .with("empty", Arc::new(FakeGraph::without_schema()))
            .with("recommendations", movies_graph());
        let runner = runner(connector, generator, None, 1);

        let databases = ["movies", "unreachable", "empty", "recommendations"].map(String::from);
        let run = runner.run(&databases).await;

        assert!(!run.is_complete());
        assert_eq!(run.records.len(), 8);
        assert_eq!(run.records[0].database, "movies");
        assert_eq!(run.records[7].database, "recommendations");

        let failed: Vec<_> = run.failures.iter().map(|f| f.database.as_str()).collect();
        assert_eq!(failed, vec!["unreachable", "empty"]);
        assert!(matches!(run.failures[0].error, PipelineError::Graph(_)));
        assert!(matches!(run.failures[1].error, PipelineError::Catalog(_)));
    }

    #[tokio::test]
    async fn test_model_outage_aborts_only_that_target() {
        // one scripted response: the second target finds the model exhausted
        let generator = Arc::new(FakeModel::generating(&[&generation_response()]));
        let connector = FakeConnector::default()
            .with("movies", movies_graph())
            .with("recommendations", movies_graph());
        let runner = runner(connector, generator, None, 1);

        let run = runner
            .run(&["movies".to_string(), "recommendations".to_string()])
            .await;

        assert_eq!(run.records.len(), 4);
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].database, "recommendations");
        assert!(matches!(run.failures[0].error, PipelineError::Llm(_)));
    }
}
