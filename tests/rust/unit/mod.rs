//! Unit tests - exercise public APIs without a graph database or model
//!
//! These tests cover parsing and sanitizing edge cases across module boundaries.

mod response_robustness_tests;
mod sanitizer_property_tests;
