//! Schema conformance scoring for generated queries
//!
//! The score is the fraction of a query's schema references that exist in the
//! target database's schema. Only a perfect 1.0 counts as conformant; anything less
//! comes with diagnostics naming the missing references.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use super::cypher_refs::extract_references;
use super::graph_schema::GraphSchema;

/// Outcome of a conformance check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaValidation {
    /// In `[0.0, 1.0]`
    pub score: f64,
    pub diagnostics: Vec<String>,
}

impl SchemaValidation {
    pub fn conformant() -> Self {
        Self {
            score: 1.0,
            diagnostics: Vec::new(),
        }
    }

    /// No partial credit: every reference must resolve
    pub fn is_conformant(&self) -> bool {
        self.score == 1.0
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, cypher: &str, database: &str) -> SchemaValidation;
}

/// Discovered schemas keyed by database name
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    schemas: RwLock<HashMap<String, Arc<GraphSchema>>>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, database: &str, schema: GraphSchema) -> Arc<GraphSchema> {
        let schema = Arc::new(schema);
        let mut schemas = self
            .schemas
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        schemas.insert(database.to_string(), Arc::clone(&schema));
        schema
    }

    pub fn get(&self, database: &str) -> Option<Arc<GraphSchema>> {
        let schemas = self
            .schemas
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        schemas.get(database).cloned()
    }
}

/// Score `cypher` against `schema`.
pub fn score_against(schema: &GraphSchema, cypher: &str) -> SchemaValidation {
    let references = extract_references(cypher);
    if references.is_empty() {
        return SchemaValidation::conformant();
    }

    let diagnostics: Vec<String> = references
        .iter()
        .filter(|reference| !reference.exists_in(schema))
        .map(|reference| format!("unknown {}", reference))
        .collect();

    let resolved = references.len() - diagnostics.len();
    SchemaValidation {
        score: resolved as f64 / references.len() as f64,
        diagnostics,
    }
}

impl SchemaValidator for SchemaCatalog {
    fn validate(&self, cypher: &str, database: &str) -> SchemaValidation {
        match self.get(database) {
            Some(schema) => score_against(&schema, cypher),
            None => SchemaValidation {
                score: 0.0,
                diagnostics: vec![format!("no schema registered for database `{}`", database)],
            },
        }
    }
}
