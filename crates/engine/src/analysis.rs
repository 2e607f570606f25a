//! Lightweight query characteristics: question type, tone, complexity.

use crate::text;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    What,
    How,
    When,
    Where,
    Who,
    Statement,
}

impl QuestionType {
    /// Spanish description used in prompts; `None` for plain statements.
    pub fn description(&self) -> Option<&'static str> {
        match self {
            Self::What => Some("pregunta sobre qué"),
            Self::How => Some("pregunta sobre cómo"),
            Self::When => Some("pregunta sobre cuándo"),
            Self::Where => Some("pregunta sobre dónde"),
            Self::Who => Some("pregunta sobre quién"),
            Self::Statement => None,
        }
    }
}

/// Emotional tone; precedence urgent > negative > positive > neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Urgent,
    Negative,
    Positive,
    Neutral,
}

impl Tone {
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::Urgent => Some("El usuario necesita una respuesta rápida y directa"),
            Self::Negative => {
                Some("El usuario puede estar frustrado, responde con extra empatía")
            }
            Self::Positive => Some("El usuario parece estar de buen ánimo"),
            Self::Neutral => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryCharacteristics {
    pub chars: usize,
    pub words: usize,
    pub question_type: QuestionType,
    pub tone: Tone,
    pub complexity: Complexity,
}

impl QueryCharacteristics {
    pub fn is_question(&self) -> bool {
        self.question_type != QuestionType::Statement
    }
}

const URGENT: &[&str] = &["urgente", "rapido", "ahora", "inmediato", "ya"];
const NEGATIVE: &[&str] = &["mal", "problema", "error", "falla", "no"];
const POSITIVE: &[&str] = &["gracias", "bien", "bueno", "excelente", "perfecto"];

pub fn analyze(utterance: &str) -> QueryCharacteristics {
    let folded = text::fold(utterance);
    let words = text::words(&folded);
    let has = |w: &str| words.contains(&w);
    let any = |set: &[&str]| set.iter().any(|w| has(w));

    let question_type = if has("que") {
        QuestionType::What
    } else if has("como") {
        QuestionType::How
    } else if has("cuando") {
        QuestionType::When
    } else if has("donde") {
        QuestionType::Where
    } else if has("quien") {
        QuestionType::Who
    } else {
        QuestionType::Statement
    };

    let tone = if any(URGENT) {
        Tone::Urgent
    } else if any(NEGATIVE) {
        Tone::Negative
    } else if any(POSITIVE) {
        Tone::Positive
    } else {
        Tone::Neutral
    };

    let complexity = match words.len() {
        0..=5 => Complexity::Simple,
        6..=10 => Complexity::Medium,
        _ => Complexity::Complex,
    };

    QueryCharacteristics {
        chars: utterance.chars().count(),
        words: words.len(),
        question_type,
        tone,
        complexity,
    }
}
