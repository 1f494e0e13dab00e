//! Robustness tests for model response parsing
//!
//! Model output is untrusted text. Parsing must degrade to partial or empty
//! results, never panic.

#[cfg(test)]
mod response_robustness_tests {
    use cyphersynth::generation::response_parser::repair_json;
    use cyphersynth::generation::{extract_json_from_markdown, lenient_parse, parse_candidates, Complexity};
    use serde_json::json;
    use test_case::test_case;

    /// Malformed payloads must not panic
    #[test]
    fn test_garbage_does_not_panic() {
        let inputs = vec![
            "",
            "```",
            "```json",
            "```json\n```",
            "[",
            "{",
            "]]]]",
            "}{",
            "[{\"question\": \"",
            "[{'question': 'x', 'cypher': }",
            "{\"a\": [1, 2, {\"b\": ",
            "\\u12",
            "[\"\\",
            "nul",
            "tru",
            "[1e, -, +, .5]",
            "/* never closed",
            "// only a comment",
        ];

        for input in inputs {
            let _ = lenient_parse(input);
            let _ = repair_json(input);
            let _ = extract_json_from_markdown(input);
        }
    }

    #[test]
    fn test_deep_nesting_is_bounded() {
        let deep = "[".repeat(10_000);
        assert!(repair_json(&deep).is_some());
    }

    #[test_case("Sure! Here you go:\n```json\n[{\"question\": \"q\", \"cypher\": \"MATCH (n) RETURN n\"}]\n```" ; "fenced after prose")]
    #[test_case("[{question: 'q', cypher: 'MATCH (n) RETURN n',}]" ; "bare keys and single quotes")]
    #[test_case("```json\n[{\"question\": \"q\", \"cypher\": \"MATCH (n) RETURN n\"}, {\"question\": \"cut" ; "truncated response")]
    fn test_first_candidate_survives(response: &str) {
        let value = extract_json_from_markdown(response).expect("payload");
        let batch = parse_candidates(value);

        assert!(!batch.candidates.is_empty());
        assert_eq!(batch.candidates[0].question, "q");
        assert_eq!(batch.candidates[0].cypher, "MATCH (n) RETURN n");
        assert_eq!(batch.candidates[0].complexity, Complexity::ZeroHop);
    }

    #[test]
    fn test_mixed_batch_keeps_good_records() {
        let value = json!([
            {"question": "Who directed Heat?", "cypher": "MATCH (p:Person)-[:DIRECTED]->(m:Movie {title: 'Heat'}) RETURN p.name", "query_type": "Lookup"},
            {"question": "missing cypher"},
            "not a record",
            {"cypher": "MATCH (n) RETURN count(n)"},
        ]);

        let batch = parse_candidates(value);
        assert_eq!(batch.candidates.len(), 1);
        assert_eq!(batch.rejected.len(), 3);
        assert_eq!(batch.candidates[0].complexity, Complexity::OneHop);
    }

    #[test]
    fn test_prose_only_response_yields_nothing() {
        let response = "I could not find enough data in the sample paths to write questions.";
        let batch = extract_json_from_markdown(response)
            .map(parse_candidates)
            .unwrap_or_default();
        assert!(batch.is_empty());
    }
}
