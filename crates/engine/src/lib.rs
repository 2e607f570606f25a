//! The hybrid decision engine — the heart of Vesta.
//!
//! Every utterance is answered by exactly one branch:
//!
//! 1. **Instant cache**: hand-authored greetings and clock answers
//! 2. **Persistent cache**: recent generative answers within their TTL
//! 3. **Classic rules**: deterministic phrase table for device and safety intents
//! 4. **Generative**: domain-tailored prompt with conversation memory, under a hard timeout
//! 5. **Smart fallback**: keyword reply or apology when generation cannot answer
//!
//! [`DecisionRouter::route`] is the single entry point; [`build_router`]
//! assembles one from `AppConfig`.

pub mod analysis;
pub mod bootstrap;
pub mod cache;
pub mod classic;
pub mod classifier;
pub mod conversation;
pub mod fallback;
pub mod preferences;
pub mod prompt;
pub mod router;
pub mod temporal;
pub mod text;

pub use bootstrap::build_router;
pub use cache::{CacheStats, ResponseCache};
pub use classic::{BasicIntentHandler, ClassicMatch, ClassicMatcher, IntentHandler, MessageParts};
pub use classifier::DomainClassifier;
pub use conversation::{ConversationMemory, MemoryLookup, MemoryReason, MemorySettings, MemoryStats};
pub use fallback::{FallbackReason, SmartFallback};
pub use preferences::{FilePreferences, StaticPreferences};
pub use prompt::{PromptBuilder, PromptInput};
pub use router::{DecisionRouter, RouterSettings};
