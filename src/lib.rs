//! mediascout library
//!
//! Search-augmented media lookup: a bounded tool-calling exchange with an
//! OpenAI-compatible model, pluggable web search providers, JSON recovery and
//! cover image resolution.

pub mod agent;
pub mod cli;
pub mod config;
pub mod extract;
pub mod llm;
pub mod logging;
pub mod media;
pub mod poster;
pub mod search;
pub mod service;
pub mod tool;

pub use service::MediaScout;
