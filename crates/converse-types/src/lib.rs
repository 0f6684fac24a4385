//! Shared domain types for Converse.
//!
//! This crate holds the data shapes exchanged between the core orchestration
//! logic, the infrastructure layer, and the HTTP API: turns, identifiers,
//! inference request/error types, and the error taxonomies.

pub mod error;
pub mod identity;
pub mod llm;
pub mod turn;
