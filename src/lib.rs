//! cyphersynth - verified text-to-Cypher evaluation datasets
//!
//! This crate drives a language model to write natural-language questions paired
//! with single-value Cypher queries, grounded in a live Neo4j graph:
//! - Sample multi-hop paths and the schema as grounding context
//! - Parse loosely structured model output into typed candidates
//! - Gate every candidate on schema conformance, then on execution cardinality
//! - Optionally answer the verified questions from their query results

pub mod answer_synthesis;
pub mod config;
pub mod generation;
pub mod graph_catalog;
pub mod graph_db;
pub mod llm;
pub mod pipeline;
pub mod sampling;
pub mod verification;
