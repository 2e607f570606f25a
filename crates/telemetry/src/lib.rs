//! Decision telemetry for Vesta.
//!
//! Every routed utterance leaves one record: which branch answered, why,
//! how long it took and whether it succeeded. The log is bounded and
//! write-only from the router's side; the gateway and CLI read it for
//! diagnostics.

pub mod engine;
pub mod model;

pub use engine::DecisionLog;
pub use model::{DecisionRecord, DecisionStats};
