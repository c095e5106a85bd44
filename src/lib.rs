/// Searchbox - request orchestration for search widgets
///
/// Core library providing debounced autocomplete, explicit search submission
/// and AI-augmented search over a pluggable HTTP transport.

pub mod config;
pub mod core;


pub use crate::core::orchestrator::{
    RequestTicket, SearchEvent, SearchEvents, SearchOrchestrator, SearchOrchestratorBuilder,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
