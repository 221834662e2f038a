//! # foresight-llm
//!
//! The LLM provider boundary consumed by agents.
//!
//! - **[`provider`]**: the [`provider::Provider`] trait, completion
//!   request/response types, and the [`provider::ProviderError`] taxonomy
//!   that drives the agents' retry policy.
//! - **[`openai`]**: an OpenAI-compatible chat-completions client.
//!
//! ## Crate Position
//!
//! Boundary crate. Depends on foresight-core. Depended on by
//! foresight-runtime and foresight-server.

#![deny(unsafe_code)]

pub mod openai;
pub mod provider;

pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::{CompletionRequest, CompletionResponse, Provider, ProviderError, ProviderResult};
