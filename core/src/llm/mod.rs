//! LLM module: OpenRouter HTTP client and request construction
//!
//! This module provides:
//! - `LlmClientConfig`, `LlmClient` for talking to the OpenRouter
//!   chat-completions endpoint
//! - `DEFAULT_MODEL`, the free-tier model used when a request names none

mod client;

pub use client::{LlmClient, LlmClientConfig, DEFAULT_MODEL};
