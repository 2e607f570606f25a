//! Which generated answers may be stored in the persistent tier.

use crate::text;
use vesta_core::domain::Domain;

/// Answers mentioning the present moment go stale immediately.
const TEMPORAL_TERMS: &[&str] = &["hoy", "ahora", "actualmente", "en este momento", "today", "now"];

/// Queries about the user or their schedule are personal.
const PERSONAL_TERMS: &[&str] = &["tu nombre", "te llamas", "recordatorio", "cita medica", "cita"];

/// Hobby and general-knowledge domains are cacheable regardless of length.
const EVERGREEN_DOMAINS: &[Domain] = &[
    Domain::Plants,
    Domain::Cooking,
    Domain::Information,
    Domain::Entertainment,
];

/// Minimum response length for other domains.
pub const MIN_RESPONSE_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Cacheable,
    TemporalContent,
    PersonalQuery,
    TooShort,
}

impl Verdict {
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Cacheable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cacheable => "cacheable",
            Self::TemporalContent => "temporal_content",
            Self::PersonalQuery => "personal_query",
            Self::TooShort => "too_short",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CachePolicy;

impl CachePolicy {
    pub fn evaluate(&self, query: &str, response: &str, domain: Domain) -> Verdict {
        let response_folded = text::fold(response);
        let response_words = text::words(&response_folded);
        if text::find_term(&response_words, TEMPORAL_TERMS).is_some() {
            return Verdict::TemporalContent;
        }

        let query_folded = text::fold(query);
        let query_words = text::words(&query_folded);
        if text::find_term(&query_words, PERSONAL_TERMS).is_some() {
            return Verdict::PersonalQuery;
        }

        if EVERGREEN_DOMAINS.contains(&domain) || response.chars().count() > MIN_RESPONSE_CHARS {
            Verdict::Cacheable
        } else {
            Verdict::TooShort
        }
    }
}
