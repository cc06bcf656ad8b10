//! `genai-client`: blocking driver for the Gemini `generateContent` REST API.
//!
//! The `tix` workspace only ever needs single-shot text generation: one prompt
//! in, one block of text out. This crate keeps that surface small and typed so
//! callers never handle raw JSON.
//!
//! # Architecture
//!
//! ```text
//! GenerationOptions
//!     │
//!     ▼
//! GeminiClient        ← POST {base}/v1beta/models/{model}:generateContent
//!     │                  blocking reqwest, API key header
//!     ▼
//! GenerateResponse    ← candidates / parts / promptFeedback, typed
//!     │
//!     ▼
//! String              ← concatenated text parts of the first candidate
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use genai_client::{GeminiClient, GenerationOptions};
//!
//! let client = GeminiClient::new("API_KEY", "gemini-2.0-flash");
//! let text = client.generate("Write a haiku about sprints.", &GenerationOptions::default())?;
//! println!("{text}");
//! ```

pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::{GeminiClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::GenAiError;
pub use types::{
    Candidate, Content, GenerateRequest, GenerateResponse, GenerationConfig, GenerationOptions,
    Part, PromptFeedback, UsageMetadata,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, GenAiError>;
