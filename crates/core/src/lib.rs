//! # Vesta Core
//!
//! Domain types, collaborator traits, and error definitions for the Vesta
//! hybrid decision engine. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (generative model, memory store, user profile
//! source) is a trait here. Implementations live in their respective crates,
//! so the router can be exercised with in-process fakes.

pub mod domain;
pub mod error;
pub mod event;
pub mod generative;
pub mod intent;
pub mod memory;
pub mod preferences;
pub mod route;
pub mod utterance;

// Re-export key types at crate root for ergonomics
pub use domain::{Domain, DomainClassification};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use generative::{GenerativeClient, Generation};
pub use intent::Intent;
pub use memory::{MemoryRecord, MemoryStore};
pub use preferences::{PreferenceProvider, ToneStyle, UserPreferenceSnapshot};
pub use route::{Route, RouteDecision, RouteResponse};
pub use utterance::{SessionId, Utterance};
