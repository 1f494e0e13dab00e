//! Property-style tests for the sampled-path sanitizer

#[cfg(test)]
mod sanitizer_property_tests {
    use cyphersynth::sampling::{sanitize_rows, sanitize_value, DEFAULT_MAX_LIST_LEN};
    use serde_json::{json, Map, Value};
    use test_case::test_case;

    fn longest_list(value: &Value) -> usize {
        match value {
            Value::Array(items) => items
                .iter()
                .map(longest_list)
                .max()
                .unwrap_or(0)
                .max(items.len()),
            Value::Object(map) => map.values().map(longest_list).max().unwrap_or(0),
            _ => 0,
        }
    }

    fn embedding(len: usize) -> Value {
        Value::Array((0..len).map(|i| json!(i as f64 / 10.0)).collect())
    }

    /// A sampled path row as the sampling query returns it
    fn path_row(embedding_len: usize) -> Map<String, Value> {
        let row = json!({
            "pathLength": 2,
            "nodesInfo": [
                {"labels": ["Person"], "props": {"name": "Keanu Reeves", "embedding": embedding(embedding_len)}},
                {"labels": ["Movie"], "props": {"title": "The Matrix", "genres": ["Action", "Sci-Fi"], "plotEmbedding": embedding(embedding_len)}},
                {"labels": ["Person"], "props": {"name": "Lana Wachowski", "born": null}},
            ],
            "relsInfo": [
                {"type": "ACTED_IN", "props": {"roles": ["Neo"]}},
                {"type": "DIRECTED", "props": {}},
            ],
            "pathSignature": "(:Person)-[:ACTED_IN]->(:Movie)-[:DIRECTED]->(:Person)",
        });
        match row {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test_case(0 ; "no embeddings")]
    #[test_case(55 ; "just under threshold")]
    #[test_case(56 ; "at threshold")]
    #[test_case(1536 ; "real embedding size")]
    fn test_no_oversized_list_survives(embedding_len: usize) {
        let rows = vec![path_row(embedding_len), path_row(embedding_len)];
        let sanitized = sanitize_rows(rows, DEFAULT_MAX_LIST_LEN);

        assert_eq!(sanitized.as_array().unwrap().len(), 2);
        assert!(longest_list(&sanitized) < DEFAULT_MAX_LIST_LEN);
    }

    #[test]
    fn test_structure_and_scalars_are_kept() {
        let sanitized = sanitize_rows(vec![path_row(1536)], DEFAULT_MAX_LIST_LEN);
        let row = &sanitized[0];

        assert_eq!(row["pathLength"], 2);
        assert_eq!(row["nodesInfo"][0]["props"]["name"], "Keanu Reeves");
        assert!(row["nodesInfo"][0]["props"].get("embedding").is_none());
        assert_eq!(row["nodesInfo"][1]["props"]["genres"], json!(["Action", "Sci-Fi"]));
        assert!(row["nodesInfo"][1]["props"].get("plotEmbedding").is_none());
        assert_eq!(row["nodesInfo"][2]["props"]["born"], Value::Null);
        assert_eq!(row["relsInfo"][0]["props"]["roles"], json!(["Neo"]));
        assert_eq!(row["relsInfo"][1]["props"], json!({}));
    }

    #[test]
    fn test_short_embeddings_are_kept() {
        let sanitized = sanitize_rows(vec![path_row(8)], DEFAULT_MAX_LIST_LEN);
        assert_eq!(
            sanitized[0]["nodesInfo"][0]["props"]["embedding"]
                .as_array()
                .map(Vec::len),
            Some(8)
        );
    }

    #[test]
    fn test_sanitizing_is_idempotent() {
        let once = sanitize_rows(vec![path_row(100), path_row(3)], DEFAULT_MAX_LIST_LEN);
        let twice = sanitize_value(&once, DEFAULT_MAX_LIST_LEN).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_custom_threshold() {
        let value = json!({"tags": ["a", "b", "c"], "pair": [1, 2]});
        let sanitized = sanitize_value(&value, 3).unwrap();
        assert_eq!(sanitized, json!({"pair": [1, 2]}));
    }
}
