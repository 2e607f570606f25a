//! Classic rule path: a fixed phrase table mapped to discrete intents.
//!
//! Matching is substring containment on folded text, first intent in table
//! order wins, and confidence is binary. The matched intent is answered by an
//! [`IntentHandler`]; side effects (plugs, reminders, outbound messages) are
//! executed by external collaborators that read the command category from the
//! response metadata.

use crate::temporal;
use crate::text;
use async_trait::async_trait;
use regex_lite::Regex;
use serde::Serialize;
use tracing::debug;
use vesta_core::intent::Intent;
use vesta_core::preferences::UserPreferenceSnapshot;

/// Confidence reported when a phrase matched.
pub const MATCH_CONFIDENCE: f32 = 0.95;
/// Confidence reported when nothing matched.
pub const NO_MATCH_CONFIDENCE: f32 = 0.1;

/// Only matches when it is the whole utterance.
const EXACT_ONLY: &str = "la hora";

fn phrase_table() -> Vec<(Intent, &'static [&'static str])> {
    vec![
        (
            Intent::GetDate,
            &["qué día", "cual dia", "cuál es la fecha", "que fecha", "what day is it", "what is the date"],
        ),
        (
            Intent::GetTime,
            &[
                "qué hora es", "dime la hora", "dame la hora", "dígame la hora", "cuál es la hora",
                "qué horas son", "que hora son", "la hora", "me puede dar la hora",
                "me puedes dar la hora", "podrías darme la hora", "what time is it",
            ],
        ),
        (Intent::PlugOn, &["enciende el enchufe", "prende el enchufe"]),
        (Intent::PlugOff, &["apaga el enchufe"]),
        (Intent::EmergencyAlert, &["ayuda", "emergencia", "pide ayuda", "help me"]),
        (Intent::ContactPerson, &["llama a", "contacta a", "avísale a", "avisa a"]),
        (
            Intent::CreateDailyReminder,
            &["recuérdame todos los días", "recordatorio diario", "todos los días recuérdame"],
        ),
        (
            Intent::CreateReminder,
            &["recuérdame", "recordatorio", "recuerda que", "no olvides"],
        ),
        (
            Intent::ListReminders,
            &["qué recordatorios", "cuáles son mis recordatorios", "mis recordatorios", "lista recordatorios"],
        ),
        (
            Intent::DeleteReminder,
            &[
                "elimina", "borra", "cancela recordatorio", "quita recordatorio",
                "elimina recordatorio", "borra recordatorio", "elimina el recordatorio",
            ],
        ),
        (
            Intent::ReadMessages,
            &[
                "lee el mensaje", "lee los mensajes", "leer mensaje", "lee mensaje",
                "mostrar mensaje", "muestra mensaje", "revisar mensaje", "qué mensaje",
                "cuáles mensajes", "tienes mensajes", "tengo mensajes", "dime los mensajes",
                "dime qué mensajes", "enséñame los mensajes", "ver mensaje",
            ],
        ),
        (
            Intent::SendMessage,
            &[
                "dile a", "avísale a", "envíale un mensaje a", "envía un mensaje a", "dígale a",
                "pregúntale a", "pregunta a", "mándale un mensaje a", "manda un mensaje a",
                "envíale a", "manda mensaje a", "envía mensaje a", "haz el favor de preguntar",
                "podrías preguntar", "te pido que preguntes", "te pido que le preguntes",
                "por favor pregunta", "me haces el favor de preguntar", "quiero que sepas",
                "me gustaría que supieras", "necesito que sepas", "quisiera que le dijeras",
                "me gustaría que le dijeras", "haz el favor de decirle", "podrías decirle",
            ],
        ),
        (
            Intent::ShutdownDevice,
            &["apágate", "apaga te", "apaga el dispositivo", "apagar sistema", "apagar el sistema"],
        ),
    ]
}

/// Extraction patterns for outbound messages, over folded text.
///
/// Group 1 is the command, group 2 the contact, group 3 the body. The
/// indirect forms ("quiero saber de ...") cap the contact at two words so
/// that ordinary questions are not read as messages.
const SEND_PATTERNS: &[&str] = &[
    r"(dile a|avisale a|enviale un mensaje a|envia un mensaje a|digale a|avisa a|mandale un mensaje a|manda un mensaje a|enviale a|manda mensaje a|envia mensaje a)\s+(.+?)\s+(que\s+.+)",
    r"(preguntale a|pregunta a)\s+(.+?)\s+((?:si|que|como|cuando|donde|por que|a que)\s+.+)",
    r"(quiero saber|me gustaria saber|quisiera saber|me interesa saber)\s+(?:de\s+|sobre\s+)?(\S+(?:\s+\S+)??)\s+((?:a que|que|cuando|donde|como|si)\s+.+)",
    r"(sera que|no se si|me pregunto si)\s+(\S+(?:\s+\S+)??)\s+((?:ya|esta|viene|va|llego|puede|tiene)\s+.+)",
    r"(haz el favor de preguntarle? a|podrias preguntarle? a|te pido que le preguntes a|por favor preguntale? a|disculpa podrias preguntarle? a|me haces el favor de preguntarle? a)\s+(.+?)\s+((?:si|que|como|cuando|a que)\s+.+)",
];

/// Parts of an outbound message command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageParts {
    pub command: String,
    pub contact: String,
    pub body: String,
}

/// Result of matching one utterance against the phrase table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassicMatch {
    pub intent: Option<Intent>,
    pub confidence: f32,
    /// Table phrase that matched, folded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageParts>,
}

impl ClassicMatch {
    fn none() -> Self {
        Self {
            intent: None,
            confidence: NO_MATCH_CONFIDENCE,
            phrase: None,
            message: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.intent.is_some()
    }
}

/// Phrase-table matcher, built once.
pub struct ClassicMatcher {
    table: Vec<(Intent, Vec<String>)>,
    send_patterns: Vec<Regex>,
}

impl ClassicMatcher {
    pub fn new() -> Self {
        let table = phrase_table()
            .into_iter()
            .map(|(intent, phrases)| (intent, phrases.iter().map(|p| text::fold(p)).collect()))
            .collect();
        let send_patterns = SEND_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            table,
            send_patterns,
        }
    }

    /// Match `utterance`; the first intent (in table order) with a contained phrase wins.
    pub fn match_intent(&self, utterance: &str) -> ClassicMatch {
        let folded = text::fold(utterance.trim());
        if folded.is_empty() {
            return ClassicMatch::none();
        }
        let bare = folded.trim_matches(|c: char| c.is_whitespace() || "¿?¡!.,;:".contains(c));

        for (intent, phrases) in &self.table {
            let hit = phrases.iter().find(|p| {
                if p.as_str() == EXACT_ONLY {
                    bare == EXACT_ONLY
                } else {
                    folded.contains(p.as_str())
                }
            });
            if let Some(phrase) = hit {
                debug!(intent = %intent, phrase = %phrase, "Classic phrase matched");
                let message = if *intent == Intent::SendMessage {
                    self.parse_send_message(utterance)
                } else {
                    None
                };
                return ClassicMatch {
                    intent: Some(*intent),
                    confidence: MATCH_CONFIDENCE,
                    phrase: Some(phrase.clone()),
                    message,
                };
            }
        }

        // Indirect forms are too broad for the phrase table and only count
        // when a contact and body can be extracted.
        if let Some(parts) = self.parse_send_message(utterance) {
            debug!(command = %parts.command, "Indirect message command matched");
            return ClassicMatch {
                intent: Some(Intent::SendMessage),
                confidence: MATCH_CONFIDENCE,
                phrase: Some(text::fold(&parts.command)),
                message: Some(parts),
            };
        }

        ClassicMatch::none()
    }

    /// Extract command, contact and body from an outbound message request.
    ///
    /// Matching runs on folded text; the returned parts keep the user's
    /// accents (lowercased).
    pub fn parse_send_message(&self, utterance: &str) -> Option<MessageParts> {
        let lower = utterance.trim().to_lowercase();
        let folded = text::fold(&lower);
        // Folding maps one char to one char, so char offsets line up
        if folded.chars().count() != lower.chars().count() {
            return None;
        }

        self.send_patterns.iter().find_map(|re| {
            let caps = re.captures(&folded)?;
            let part = |i: usize| {
                let m = caps.get(i)?;
                let start = folded[..m.start()].chars().count();
                let len = m.as_str().chars().count();
                Some(lower.chars().skip(start).take(len).collect::<String>().trim().to_string())
            };
            Some(MessageParts {
                command: part(1)?,
                contact: part(2)?,
                body: part(3)?,
            })
        })
    }
}

impl Default for ClassicMatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ── Intent handling ───────────────────────────────────────────────────────

/// Produces the spoken answer for a matched intent.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(
        &self,
        intent: Intent,
        matched: &ClassicMatch,
        preferences: &UserPreferenceSnapshot,
    ) -> vesta_core::Result<String>;
}

/// Built-in handler: answers time and date, acknowledges everything else.
pub struct BasicIntentHandler;

#[async_trait]
impl IntentHandler for BasicIntentHandler {
    fn name(&self) -> &str {
        "basic"
    }

    async fn handle(
        &self,
        intent: Intent,
        matched: &ClassicMatch,
        preferences: &UserPreferenceSnapshot,
    ) -> vesta_core::Result<String> {
        let reply = match intent {
            Intent::GetTime => temporal::spoken_time_now(),
            Intent::GetDate => temporal::spoken_date_now(),
            Intent::PlugOn => "Listo, enciendo el enchufe.".to_string(),
            Intent::PlugOff => "Listo, apago el enchufe.".to_string(),
            Intent::EmergencyAlert => {
                "Estoy avisando a sus contactos de emergencia. Mantenga la calma, la ayuda va en camino."
                    .to_string()
            }
            Intent::ContactPerson => "Enseguida me comunico con esa persona.".to_string(),
            Intent::CreateDailyReminder => {
                "Entendido, voy a crear un recordatorio diario.".to_string()
            }
            Intent::CreateReminder => "Entendido, voy a crear el recordatorio.".to_string(),
            Intent::ListReminders => "Estos son sus recordatorios.".to_string(),
            Intent::DeleteReminder => "De acuerdo, elimino el recordatorio.".to_string(),
            Intent::ReadMessages => "Reviso sus mensajes.".to_string(),
            Intent::SendMessage => match &matched.message {
                Some(parts) => format!("Le envío el mensaje a {}: {}", parts.contact, parts.body),
                None => "¿A quién le quiere enviar el mensaje?".to_string(),
            },
            Intent::ShutdownDevice => format!("Hasta pronto, {}.", preferences.name),
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_time_question() {
        let m = ClassicMatcher::new().match_intent("what time is it");
        assert_eq!(m.intent, Some(Intent::GetTime));
        assert_eq!(m.confidence, MATCH_CONFIDENCE);
    }

    #[test]
    fn accents_do_not_matter() {
        let matcher = ClassicMatcher::new();
        assert_eq!(matcher.match_intent("Dígame la hora").intent, Some(Intent::GetTime));
        assert_eq!(matcher.match_intent("digame la hora").intent, Some(Intent::GetTime));
        assert_eq!(matcher.match_intent("¿Qué día es hoy?").intent, Some(Intent::GetDate));
    }

    #[test]
    fn la_hora_only_as_whole_utterance() {
        let matcher = ClassicMatcher::new();
        assert_eq!(matcher.match_intent("¿La hora?").intent, Some(Intent::GetTime));
        assert_eq!(matcher.match_intent("llegó la hora de comer").intent, None);
    }

    #[test]
    fn daily_reminder_beats_plain_reminder() {
        let m = ClassicMatcher::new().match_intent("recuérdame todos los días tomar agua");
        assert_eq!(m.intent, Some(Intent::CreateDailyReminder));
    }

    #[test]
    fn no_match_has_low_confidence() {
        let m = ClassicMatcher::new().match_intent("cuéntame sobre las orquídeas");
        assert!(!m.is_match());
        assert_eq!(m.confidence, NO_MATCH_CONFIDENCE);
    }

    #[test]
    fn send_message_extracts_parts_with_accents() {
        let m = ClassicMatcher::new().match_intent("Dile a Marina que llegué bien");
        assert_eq!(m.intent, Some(Intent::SendMessage));
        let parts = m.message.unwrap();
        assert_eq!(parts.command, "dile a");
        assert_eq!(parts.contact, "marina");
        assert_eq!(parts.body, "que llegué bien");
    }

    #[test]
    fn indirect_message_needs_contact() {
        let matcher = ClassicMatcher::new();
        let m = matcher.match_intent("quiero saber de Mónica a qué hora viene");
        assert_eq!(m.intent, Some(Intent::SendMessage));
        assert_eq!(m.message.unwrap().contact, "mónica");

        let plain = matcher.match_intent("quiero saber qué es la sábila y cómo se siembra");
        assert_eq!(plain.intent, None);
    }

    #[test]
    fn blank_is_no_match() {
        assert!(!ClassicMatcher::new().match_intent("   ").is_match());
    }

    #[tokio::test]
    async fn basic_handler_answers_time() {
        let matcher = ClassicMatcher::new();
        let m = matcher.match_intent("dime la hora");
        let reply = BasicIntentHandler
            .handle(Intent::GetTime, &m, &UserPreferenceSnapshot::default())
            .await
            .unwrap();
        assert!(reply.starts_with("Son las "));
    }

    #[tokio::test]
    async fn basic_handler_confirms_message() {
        let matcher = ClassicMatcher::new();
        let m = matcher.match_intent("dile a Marina que llegué bien");
        let reply = BasicIntentHandler
            .handle(Intent::SendMessage, &m, &UserPreferenceSnapshot::default())
            .await
            .unwrap();
        assert_eq!(reply, "Le envío el mensaje a marina: que llegué bien");
    }
}
