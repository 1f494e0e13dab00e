//! In-memory graph database, connector and model used by the integration tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cyphersynth::graph_db::{GraphConnector, GraphDatabase, GraphDbError, Row};
use cyphersynth::llm::{ChatMessage, LanguageModel, LlmError};
use serde_json::{json, Value};

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("not a row: {}", other),
    }
}

/// A tiny movie graph. Introspection and sampling queries are answered from
/// fixed data; any other query is looked up in the scripted responses.
#[derive(Default)]
pub struct FakeGraph {
    scripted: HashMap<String, Result<Vec<Row>, GraphDbError>>,
    executions: Mutex<HashMap<String, usize>>,
    empty_schema: bool,
}

impl FakeGraph {
    pub fn movies() -> Self {
        Self::default()
    }

    pub fn without_schema() -> Self {
        Self {
            empty_schema: true,
            ..Self::default()
        }
    }

    pub fn respond(mut self, cypher: &str, rows: Vec<Value>) -> Self {
        self.scripted
            .insert(cypher.to_string(), Ok(rows.into_iter().map(row).collect()));
        self
    }

    pub fn fail(mut self, cypher: &str, message: &str) -> Self {
        self.scripted
            .insert(cypher.to_string(), Err(GraphDbError::Query(message.to_string())));
        self
    }

    /// Times `cypher` was executed as a candidate
    pub fn executions_of(&self, cypher: &str) -> usize {
        self.executions
            .lock()
            .unwrap()
            .get(cypher)
            .copied()
            .unwrap_or(0)
    }

    fn introspection(&self, cypher: &str) -> Option<Vec<Row>> {
        let rows = if cypher.contains("nodeTypeProperties") {
            if self.empty_schema {
                vec![]
            } else {
                vec![
                    json!({"nodeLabels": ["Movie"], "propertyName": "title", "propertyTypes": ["String"]}),
                    json!({"nodeLabels": ["Movie"], "propertyName": "released", "propertyTypes": ["Long"]}),
                    json!({"nodeLabels": ["Person"], "propertyName": "name", "propertyTypes": ["String"]}),
                ]
            }
        } else if cypher.contains("relTypeProperties") {
            if self.empty_schema {
                vec![]
            } else {
                vec![json!({"relType": ":`ACTED_IN`", "propertyName": "roles", "propertyTypes": ["StringArray"]})]
            }
        } else if cypher.contains("DISTINCT fromLabel") {
            if cypher.contains("[:`ACTED_IN`]") {
                vec![json!({"fromLabel": "Person", "toLabel": "Movie"})]
            } else {
                vec![]
            }
        } else if cypher.contains("pathSignature") {
            vec![json!({
                "pathLength": 1,
                "nodesInfo": [
                    {"labels": ["Person"], "props": {"name": "Al Pacino"}},
                    {"labels": ["Movie"], "props": {"title": "Heat", "released": 1995}},
                ],
                "relsInfo": [{"type": "ACTED_IN", "props": {"roles": ["Vincent Hanna"]}}],
                "pathSignature": "(:Person)-[:ACTED_IN]->(:Movie)",
            })]
        } else {
            return None;
        };
        Some(rows.into_iter().map(row).collect())
    }
}

#[async_trait]
impl GraphDatabase for FakeGraph {
    async fn query(&self, _database: &str, cypher: &str) -> Result<Vec<Row>, GraphDbError> {
        if let Some(rows) = self.introspection(cypher) {
            return Ok(rows);
        }

        *self
            .executions
            .lock()
            .unwrap()
            .entry(cypher.to_string())
            .or_default() += 1;

        self.scripted
            .get(cypher)
            .cloned()
            .unwrap_or_else(|| Err(GraphDbError::Query(format!("unscripted query: {}", cypher))))
    }
}

/// Hands out the same graph per database name; unknown names fail to connect.
#[derive(Default)]
pub struct FakeConnector {
    graphs: HashMap<String, Arc<FakeGraph>>,
}

impl FakeConnector {
    pub fn with(mut self, database: &str, graph: Arc<FakeGraph>) -> Self {
        self.graphs.insert(database.to_string(), graph);
        self
    }
}

#[async_trait]
impl GraphConnector for FakeConnector {
    async fn connect(&self, database: &str) -> Result<Arc<dyn GraphDatabase>, GraphDbError> {
        match self.graphs.get(database) {
            Some(graph) => Ok(graph.clone() as Arc<dyn GraphDatabase>),
            None => Err(GraphDbError::Connection {
                uri: "bolt://fake:7687".to_string(),
                database: database.to_string(),
                message: "unauthorized".to_string(),
            }),
        }
    }
}

/// Model stand-in. Generation prompts get the scripted responses in order;
/// answer prompts get a fixed answer after `answer_delay`.
#[derive(Default)]
pub struct FakeModel {
    generations: Mutex<VecDeque<String>>,
    answer_delay: Duration,
    pub generation_calls: AtomicUsize,
    pub answer_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeModel {
    pub fn generating(responses: &[&str]) -> Self {
        Self {
            generations: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn answering_after(delay: Duration) -> Self {
        Self {
            answer_delay: delay,
            ..Self::default()
        }
    }

    async fn answer(&self) -> String {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.answer_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        "  Al Pacino played Vincent Hanna.\n".to_string()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    fn model_id(&self) -> String {
        "fake-model".to_string()
    }

    async fn complete(&self, messages: &[ChatMessage], _max_tokens: u32) -> Result<String, LlmError> {
        let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        if prompt.starts_with("Question:") {
            self.answer_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(self.answer().await);
        }

        self.generation_calls.fetch_add(1, Ordering::SeqCst);
        self.generations
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyResponse {
                provider: "Fake",
            })
    }
}
