//! Infrastructure implementations for Converse.
//!
//! Concrete backends for the trait seams defined in converse-core: SQLite
//! persistence via sqlx, the AWS Bedrock inference provider via reqwest,
//! and the TOML configuration loader.

pub mod bedrock;
pub mod config;
pub mod sqlite;
