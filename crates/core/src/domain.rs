//! Topic domains and the classification result.

use serde::{Deserialize, Serialize};

/// Coarse topic bucket used for personalization and memory continuity.
///
/// Declaration order is the registration order used for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Plants,
    Cooking,
    Pets,
    Entertainment,
    Weather,
    Personal,
    Devices,
    Conversational,
    Religion,
    Information,
    General,
}

impl Domain {
    /// All domains in registration order.
    pub const ALL: [Domain; 11] = [
        Domain::Plants,
        Domain::Cooking,
        Domain::Pets,
        Domain::Entertainment,
        Domain::Weather,
        Domain::Personal,
        Domain::Devices,
        Domain::Conversational,
        Domain::Religion,
        Domain::Information,
        Domain::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plants => "plants",
            Self::Cooking => "cooking",
            Self::Pets => "pets",
            Self::Entertainment => "entertainment",
            Self::Weather => "weather",
            Self::Personal => "personal",
            Self::Devices => "devices",
            Self::Conversational => "conversational",
            Self::Religion => "religion",
            Self::Information => "information",
            Self::General => "general",
        }
    }

    /// Neutral domains never take part in a strong topic contrast.
    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::General | Self::Information | Self::Conversational)
    }

    /// Whether moving from `self` to `next` is unrelated enough to reset memory.
    pub fn contrasts_strongly_with(&self, next: Domain) -> bool {
        if self.is_neutral() || next.is_neutral() {
            return false;
        }
        use Domain::*;
        let blocked: &[Domain] = match self {
            Plants | Cooking | Pets | Entertainment => &[Devices, Weather, Personal],
            Weather => &[Plants, Cooking, Pets, Devices, Personal],
            Devices => &[Plants, Cooking, Entertainment, Weather, Personal],
            Personal => &[Plants, Cooking, Devices, Weather],
            _ => &[],
        };
        blocked.contains(&next)
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown domain '{s}'"))
    }
}

/// A domain with the classifier's confidence in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainClassification {
    pub domain: Domain,
    /// Always within [0, 1]
    pub confidence: f32,
}

impl DomainClassification {
    pub fn new(domain: Domain, confidence: f32) -> Self {
        Self {
            domain,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// The neutral answer when nothing in the utterance is recognized.
    pub fn fallback() -> Self {
        Self::new(Domain::General, 0.1)
    }
}
