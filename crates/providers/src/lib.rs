//! Completion provider implementations for Gena.
//!
//! All providers implement the `gena_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::{OPENAI_BASE_URL, OpenAiCompatProvider};
