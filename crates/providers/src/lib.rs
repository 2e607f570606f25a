//! Generative client implementations for Vesta.
//!
//! All clients implement the `vesta_core::GenerativeClient` trait.
//! `build_from_config` selects and configures one from `AppConfig`.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatClient;
pub use router::build_from_config;
