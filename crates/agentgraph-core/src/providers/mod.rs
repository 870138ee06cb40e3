//! Built-in language-model clients.

pub mod openai_compat;

pub use openai_compat::{LlmConfig, OpenAiCompatClient};
