//! OpenAI provider implementation
//!
//! This module provides OpenAI-based chat completion.

pub mod client;
pub mod completion;
pub mod types;

pub use client::OpenAIClient;
pub use completion::OpenAICompletionProvider;
