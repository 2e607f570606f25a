//! Keyword-based domain classifier.
//!
//! Tables are built once at construction: an inverted index from keyword to
//! the domains listing it, split into single-word keywords (matched by set
//! intersection with the utterance words) and multi-word phrases (matched by
//! contiguous word sequence). Scoring adds +2 when the utterance starts with
//! the keyword and +1 otherwise, then normalizes by word count.

use crate::text;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::debug;
use vesta_core::domain::{Domain, DomainClassification};
use vesta_core::error::ClassificationError;

/// Memo entries kept before new results stop being stored.
pub const MEMO_CAPACITY: usize = 1000;

/// Longer utterances are classified afresh and never memoized.
const MEMO_MAX_KEY_CHARS: usize = 100;

/// Confidence returned for the short greeting/courtesy bypass.
pub const BYPASS_CONFIDENCE: f32 = 0.9;

const BYPASS: &[&str] = &[
    "hola",
    "gracias",
    "bien",
    "mal",
    "si",
    "no",
    "ok",
    "adios",
    "buenos dias",
    "buenas tardes",
    "buenas noches",
    "que tal",
];

/// Domain keyword lists in registration (tie-break) order.
fn domain_keywords() -> Vec<(Domain, &'static [&'static str])> {
    vec![
        (
            Domain::Plants,
            &[
                "planta", "plantas", "jardin", "jardineria", "flores", "flor", "semillas",
                "sembrar", "regar", "riego", "maceta", "tierra", "abono", "fertilizante",
                "hojas", "raices", "sabila", "rosas", "orquideas", "huerto", "podar", "cactus",
            ],
        ),
        (
            Domain::Cooking,
            &[
                "cocina", "cocinar", "receta", "recetas", "comida", "ingredientes", "preparar",
                "almuerzo", "desayuno", "cena", "sopa", "caldo", "locro", "hornear", "postre",
                "arroz", "pollo", "caldo de bola", "como preparar", "guiso", "fritada",
            ],
        ),
        (
            Domain::Pets,
            &[
                "mascota", "mascotas", "perro", "perrito", "gato", "gatito", "veterinario",
                "pajaro", "loro", "pecera", "alimentar al perro",
            ],
        ),
        (
            Domain::Entertainment,
            &[
                "musica", "cancion", "canciones", "pelicula", "peliculas", "novela", "chiste",
                "chistes", "cuento", "juego", "adivinanza", "bailar", "radio", "television",
                "pasillo", "bolero",
            ],
        ),
        (
            Domain::Weather,
            &[
                "clima", "tiempo", "lluvia", "llover", "sol", "temperatura", "frio", "calor",
                "pronostico", "nublado", "viento",
            ],
        ),
        (
            Domain::Personal,
            &[
                "familia", "hijo", "hija", "nieto", "nieta", "nietos", "esposo", "hermana",
                "recuerdo", "recuerdos", "cumpleanos", "me siento", "sola", "triste", "salud",
                "dolor", "medico", "doctor",
            ],
        ),
        (
            Domain::Devices,
            &[
                "enchufe", "luz", "luces", "encender", "apagar", "prender", "dispositivo",
                "telefono", "celular", "volumen", "alarma", "bateria",
            ],
        ),
        (
            Domain::Conversational,
            &[
                "hola", "gracias", "adios", "chao", "buenos dias", "buenas tardes",
                "buenas noches", "como estas", "que tal", "conversar", "charlar",
            ],
        ),
        (
            Domain::Religion,
            &[
                "dios", "virgen", "rezar", "oracion", "misa", "rosario", "iglesia", "santo",
                "biblia", "fe", "bendicion",
            ],
        ),
        (
            Domain::Information,
            &[
                "que es", "quien fue", "historia", "significa", "significado", "explica",
                "explicame", "informacion", "dato", "noticias", "cuantos", "capital",
            ],
        ),
    ]
}

/// Read-only keyword tables plus a bounded memo of previous results.
pub struct DomainClassifier {
    /// Registered domains in tie-break order
    order: Vec<Domain>,
    /// Single-word keyword → indices into `order`
    words: HashMap<String, Vec<usize>>,
    /// Multi-word keyword → indices into `order`
    phrases: Vec<(String, Vec<usize>)>,
    memo: RwLock<HashMap<String, DomainClassification>>,
}

impl DomainClassifier {
    pub fn new() -> Self {
        let table = domain_keywords();
        let mut order = Vec::with_capacity(table.len());
        let mut words: HashMap<String, Vec<usize>> = HashMap::new();
        let mut phrases: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, (domain, keywords)) in table.into_iter().enumerate() {
            order.push(domain);
            for kw in keywords {
                let folded = text::fold(kw);
                let target = if folded.contains(' ') {
                    &mut phrases
                } else {
                    &mut words
                };
                let domains = target.entry(folded).or_default();
                if !domains.contains(&idx) {
                    domains.push(idx);
                }
            }
        }

        let mut phrases: Vec<_> = phrases.into_iter().collect();
        phrases.sort_by(|a, b| a.0.cmp(&b.0));

        Self {
            order,
            words,
            phrases,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Number of distinct keywords across all domains.
    pub fn keyword_count(&self) -> usize {
        self.words.len() + self.phrases.len()
    }

    /// Classify `utterance`, degrading to the neutral domain on degenerate input.
    pub fn classify(&self, utterance: &str) -> DomainClassification {
        self.try_classify(utterance).unwrap_or_else(|e| {
            debug!(error = %e, "Classification degraded to general");
            DomainClassification::fallback()
        })
    }

    pub fn try_classify(
        &self,
        utterance: &str,
    ) -> Result<DomainClassification, ClassificationError> {
        let folded = text::fold(utterance.trim());
        let tokens = text::words(&folded);
        if tokens.is_empty() {
            return Err(ClassificationError::Degenerate(
                "utterance has no words".into(),
            ));
        }

        let key = tokens.join(" ");
        if key.chars().count() > MEMO_MAX_KEY_CHARS {
            return Ok(self.score(&tokens));
        }

        if let Some(hit) = self
            .memo
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&key)
        {
            return Ok(*hit);
        }

        let result = self.score(&tokens);

        let mut memo = self
            .memo
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if memo.len() < MEMO_CAPACITY {
            memo.insert(key, result);
        }
        Ok(result)
    }

    fn score(&self, tokens: &[&str]) -> DomainClassification {
        if tokens.len() <= 2 && BYPASS.iter().any(|b| text::contains_term(tokens, b)) {
            return DomainClassification::new(Domain::Conversational, BYPASS_CONFIDENCE);
        }

        let mut scores = vec![0u32; self.order.len()];
        let first = tokens.first().copied();

        let unique: HashSet<&str> = tokens.iter().copied().collect();
        for word in &unique {
            if let Some(domains) = self.words.get(*word) {
                let weight = if first == Some(*word) { 2 } else { 1 };
                for &idx in domains {
                    scores[idx] += weight;
                }
            }
        }

        for (phrase, domains) in &self.phrases {
            if text::contains_term(tokens, phrase) {
                let weight = if text::starts_with_term(tokens, phrase) {
                    2
                } else {
                    1
                };
                for &idx in domains {
                    scores[idx] += weight;
                }
            }
        }

        // Strictly greater keeps the first-registered domain on ties
        let mut best: Option<(usize, u32)> = None;
        for (idx, &score) in scores.iter().enumerate() {
            if score > 0 && best.is_none_or(|(_, s)| score > s) {
                best = Some((idx, score));
            }
        }

        match best {
            Some((idx, score)) => {
                let confidence = (score as f32 / tokens.len() as f32).min(1.0);
                DomainClassification::new(self.order[idx], confidence)
            }
            None => DomainClassification::fallback(),
        }
    }

    /// Memoized entries (diagnostics).
    pub fn memo_len(&self) -> usize {
        self.memo
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl Default for DomainClassifier {
    fn default() -> Self {
        Self::new()
    }
}
