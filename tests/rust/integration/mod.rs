//! Integration tests - run the pipeline end to end against in-memory fakes
//!
//! The fakes stand in for Neo4j and the model APIs; everything between them is
//! the real code path (schema discovery, catalog, verifier, synthesizer, runner).

mod answer_concurrency_tests;
mod pipeline_tests;
mod support;
