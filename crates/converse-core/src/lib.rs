//! Business logic for Converse: the conversation orchestration and
//! rate-limited invocation subsystem.
//!
//! The trait seams (`ConversationRepository`, `InferenceProvider`) are
//! defined here; concrete implementations live in converse-infra. The
//! orchestrator (`service::ChatService`) is generic over both so tests can
//! substitute deterministic stand-ins.

pub mod gateway;
pub mod history;
pub mod identity;
pub mod limiter;
pub mod repository;
pub mod service;
