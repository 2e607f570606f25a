//! Canned answers used when the generative route cannot answer.

use crate::text;
use serde::Serialize;
use vesta_core::error::GenerativeError;

/// Why the router fell back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    GenerativeTimeout,
    GenerativeRejected,
    GenerativeError,
    GenerativeUnavailable,
    CriticalKeyword,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerativeTimeout => "generative_timeout",
            Self::GenerativeRejected => "generative_rejected",
            Self::GenerativeError => "generative_error",
            Self::GenerativeUnavailable => "generative_unavailable",
            Self::CriticalKeyword => "critical_keyword",
        }
    }
}

impl From<&GenerativeError> for FallbackReason {
    fn from(e: &GenerativeError) -> Self {
        match e {
            GenerativeError::Timeout { .. } => Self::GenerativeTimeout,
            GenerativeError::Rejected { .. }
            | GenerativeError::RateLimited { .. }
            | GenerativeError::AuthenticationFailed(_)
            | GenerativeError::EmptyResponse => Self::GenerativeRejected,
            GenerativeError::Network(_) => Self::GenerativeError,
            GenerativeError::NotConfigured(_) => Self::GenerativeUnavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    Keyword,
    Apology,
}

impl FallbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Apology => "apology",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackReply {
    pub text: &'static str,
    pub kind: FallbackKind,
}

/// Reply for input that could not be routed at all.
pub const REPEAT_REQUEST: &str = "Lo siento, no pude procesar tu solicitud. ¿Podrías repetirla?";

const APOLOGIES: [&str; 3] = [
    "Disculpe, no entendí bien su pregunta. ¿Podría repetirla de otra manera?",
    "Lo siento, no pude procesar su consulta en este momento. ¿Podría intentar de nuevo?",
    "Perdón, no tengo una respuesta para eso. ¿Hay algo más en lo que pueda ayudarle?",
];

struct KeywordReply {
    keywords: &'static [&'static str],
    reply: &'static str,
}

const KEYWORD_REPLIES: &[KeywordReply] = &[
    KeywordReply {
        keywords: &["cocina", "receta", "comida", "cocinar", "preparar"],
        reply: "Me encantan sus preguntas de cocina. ¿Podría ser más específica sobre qué le gustaría cocinar?",
    },
    KeywordReply {
        keywords: &["planta", "plantas", "sembrar", "regar"],
        reply: "Las plantas son su especialidad. ¿Podría repetir la pregunta de otra forma?",
    },
    KeywordReply {
        keywords: &["salud", "dolor", "medicina", "doctor"],
        reply: "Para temas de salud, siempre recomiendo consultar con su médico de confianza.",
    },
];

/// Keyword table first, then one of three apologies picked by length.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartFallback;

impl SmartFallback {
    pub fn reply(&self, utterance: &str) -> FallbackReply {
        let folded = text::fold(utterance);
        let words = text::words(&folded);
        for rule in KEYWORD_REPLIES {
            if text::find_term(&words, rule.keywords).is_some() {
                return FallbackReply {
                    text: rule.reply,
                    kind: FallbackKind::Keyword,
                };
            }
        }
        FallbackReply {
            text: Self::apology(utterance),
            kind: FallbackKind::Apology,
        }
    }

    pub fn apology(utterance: &str) -> &'static str {
        APOLOGIES[utterance.chars().count() % APOLOGIES.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_first_match_wins() {
        let fb = SmartFallback;
        let r = fb.reply("¿Qué receta puedo preparar con plantas?");
        assert_eq!(r.kind, FallbackKind::Keyword);
        assert!(r.text.contains("cocina"));

        let r = fb.reply("Me duele, ¿qué medicina tomo?");
        assert!(r.text.contains("médico"));
    }

    #[test]
    fn apology_chosen_by_length() {
        let fb = SmartFallback;
        let r = fb.reply("abc");
        assert_eq!(r.kind, FallbackKind::Apology);
        assert_eq!(r.text, APOLOGIES[0]);
        assert_eq!(SmartFallback::apology("abcd"), APOLOGIES[1]);
        assert_eq!(SmartFallback::apology("ñañ"), APOLOGIES[0]);
    }

    #[test]
    fn keywords_are_whole_words() {
        // "recetario" is not "receta"
        let r = SmartFallback.reply("mi recetario");
        assert_eq!(r.kind, FallbackKind::Apology);
    }

    #[test]
    fn error_kinds_map_to_reasons() {
        assert_eq!(
            FallbackReason::from(&GenerativeError::Timeout { timeout_ms: 3000 }),
            FallbackReason::GenerativeTimeout
        );
        assert_eq!(
            FallbackReason::from(&GenerativeError::RateLimited { retry_after_secs: 5 }),
            FallbackReason::GenerativeRejected
        );
        assert_eq!(
            FallbackReason::from(&GenerativeError::Network("reset".into())).as_str(),
            "generative_error"
        );
    }
}
