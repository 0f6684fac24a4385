//! HTTP transport layer for Converse.
//!
//! Exposed as a library so integration tests can build the router with a
//! substitute inference provider; the `converse` binary wires the
//! production state in `main.rs`.

pub mod http;
pub mod state;
