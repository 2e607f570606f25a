//! Instant tier: hand-authored answers for a few normalized queries.

use crate::temporal;
use std::collections::HashMap;

/// An instant answer, either fixed text or computed at lookup time.
#[derive(Clone, Copy)]
pub enum InstantResponse {
    Literal(&'static str),
    Computed(fn() -> String),
}

impl InstantResponse {
    pub fn resolve(&self) -> String {
        match self {
            Self::Literal(text) => (*text).to_string(),
            Self::Computed(f) => f(),
        }
    }
}

impl std::fmt::Debug for InstantResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Immutable map of normalized query → instant answer.
#[derive(Debug)]
pub struct InstantTier {
    entries: HashMap<&'static str, InstantResponse>,
}

impl InstantTier {
    pub fn new() -> Self {
        use InstantResponse::*;
        let entries = HashMap::from([
            ("hola", Literal("¡Hola! ¿Cómo está usted hoy? ¿En qué puedo ayudarle?")),
            ("buenos dias", Literal("¡Buenos días! ¿Cómo amaneció hoy?")),
            ("buenas tardes", Literal("¡Buenas tardes! ¿Cómo ha estado su día?")),
            ("buenas noches", Literal("¡Buenas noches! ¿Cómo estuvo su día?")),
            ("como estas", Literal("Muy bien, gracias por preguntar. ¿En qué puedo ayudarle hoy?")),
            ("que hora es", Computed(temporal::spoken_time_now)),
            ("que dia es", Computed(temporal::spoken_date_now)),
            (
                "que es el cafe",
                Literal("El café es una bebida hecha con granos tostados y molidos de la planta del cafeto."),
            ),
            (
                "que puedo hacer de almuerzo",
                Literal("Puede preparar un locro de papa, un arroz con menestra o una sopa de verduras."),
            ),
        ]);
        Self { entries }
    }

    /// Answer for an already-normalized key.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(InstantResponse::resolve)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InstantTier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_computed_entries() {
        let tier = InstantTier::new();
        assert_eq!(
            tier.get("hola").as_deref(),
            Some("¡Hola! ¿Cómo está usted hoy? ¿En qué puedo ayudarle?")
        );
        assert!(tier.get("que hora es").unwrap().starts_with("Son las "));
        assert!(tier.get("que dia es").unwrap().starts_with("Hoy es "));
        assert!(tier.get("adios").is_none());
    }

    #[test]
    fn debug_hides_function_pointers() {
        let text = format!("{:?}", InstantResponse::Computed(temporal::spoken_time_now));
        assert_eq!(text, "Computed(..)");
    }
}
