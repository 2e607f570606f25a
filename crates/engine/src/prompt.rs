//! Prompt assembly for the generative route.
//!
//! Pure string building: persona, domain template, preference adaptations,
//! query context, optional memory excerpt, then the user's words. Templates
//! use `{placeholder}` fields; unknown placeholders render as empty text.

use crate::analysis::QueryCharacteristics;
use crate::conversation::MemoryContext;
use crate::temporal::TemporalContext;
use std::collections::HashMap;
use vesta_core::domain::{Domain, DomainClassification};
use vesta_core::preferences::{ToneStyle, UserPreferenceSnapshot};

/// Everything one prompt is built from. Borrowed for a single request.
pub struct PromptInput<'a> {
    pub utterance: &'a str,
    pub classification: DomainClassification,
    pub characteristics: &'a QueryCharacteristics,
    pub temporal: &'a TemporalContext,
    pub preferences: &'a UserPreferenceSnapshot,
    pub memory: Option<&'a MemoryContext>,
}

fn domain_template(domain: Domain) -> &'static str {
    match domain {
        Domain::Plants => {
            "CONTEXTO PERSONAL DE {user_name}:
- Le encantan las plantas: {plants}
- Tiene experiencia cuidando plantas de interior y conoce remedios caseros
- Vive en {city}

ESTILO: Reconoce su conocimiento y experiencia"
        }
        Domain::Cooking => {
            "CONTEXTO PERSONAL DE {user_name}:
- Sus comidas favoritas: {cooking}
- Conoce recetas tradicionales de su región
- De la región de {city}

INSTRUCCIONES ESPECÍFICAS PARA COCINA:
- Responde con UNA receta completa y específica (no sugerencias vagas)
- Ingredientes comunes y fáciles de conseguir
- Pasos claros y simples (máximo 4-5 pasos)
- Incluye tiempo aproximado de preparación
- Adapta para adultos mayores (preparación sencilla)

ESTILO: Reconoce su experiencia culinaria y da recetas útiles"
        }
        Domain::Pets => {
            "CONTEXTO PERSONAL DE {user_name}:
- Tiene mascotas: {pets}
- Le encantan sus mascotas

ESTILO: Muestra interés por sus mascotas"
        }
        Domain::Entertainment => {
            "CONTEXTO PERSONAL DE {user_name}:
- Le gustan: {entertainment}
- Música preferida: {music}

ESTILO: Conecta con sus gustos personales"
        }
        Domain::Weather => {
            "CONTEXTO ADICIONAL:
- {user_name} vive en {city}
- Responde de manera práctica y útil
- Sugiere acciones apropiadas según el clima

ESTILO: Informativo pero cálido"
        }
        Domain::Personal => {
            "CONTEXTO PERSONAL DE {user_name}:
- Es {user_name} de {city}, {age} años
- Temas favoritos: {topics}
- Menciona que eres {assistant_name} si preguntan

ESTILO: Cercano y familiar"
        }
        Domain::Religion => {
            "CONTEXTO PERSONAL DE {user_name}:
- Puedes hacer referencias respetuosas a la fe
- Respeta sus valores y tradiciones

ESTILO: Respetuoso y comprensivo"
        }
        Domain::Devices => {
            "CONTEXTO ADICIONAL:
- Control de dispositivos del hogar
- Capacidades: {capabilities}
{confirmation_note}

ESTILO: Técnico pero accesible"
        }
        Domain::Conversational => {
            "CONTEXTO ADICIONAL:
- Saludo o conversación casual con {user_name}
- Hora actual: {current_time}
- Período del día: {day_period}
- Saludo apropiado: {greeting}

ESTILO: Cálido y conversacional"
        }
        Domain::Information => {
            "CONTEXTO ADICIONAL:
- Consulta informativa
- Explicar de manera simple y clara
- Relacionar con el contexto local cuando sea relevante

ESTILO: Educativo pero amigable"
        }
        Domain::General => {
            "CONTEXTO ADICIONAL:
- Consulta general para {user_name}
- Responder de manera útil y empática
- Adaptarse al tono de la consulta

ESTILO: Adaptativo y amigable"
        }
    }
}

/// Replace `{name}` fields from `vars`; unknown names become empty text.
/// Braces that do not enclose an identifier are copied through.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let field_len = after
            .find(|c: char| !(c.is_ascii_lowercase() || c == '_'))
            .unwrap_or(after.len());
        if field_len > 0 && after[field_len..].starts_with('}') {
            let name = &after[..field_len];
            if let Some(value) = vars.get(name) {
                out.push_str(value);
            }
            rest = &after[field_len + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

pub struct PromptBuilder {
    assistant_name: String,
    max_words: u32,
}

impl PromptBuilder {
    pub fn new(assistant_name: impl Into<String>, max_words: u32) -> Self {
        Self {
            assistant_name: assistant_name.into(),
            max_words,
        }
    }

    pub fn build(&self, input: &PromptInput<'_>) -> String {
        let vars = self.variables(input);
        let mut prompt = self.persona(&input.preferences.name);

        prompt.push_str("\n\n");
        prompt.push_str(&render(domain_template(input.classification.domain), &vars));

        prompt.push_str(&self.adaptations(input.preferences));
        prompt.push_str(&Self::query_context(input.characteristics));
        if let Some(memory) = input.memory {
            prompt.push_str(&Self::memory_block(memory));
        }

        prompt.push_str("\n\nCONSULTA DEL USUARIO:\n");
        prompt.push_str(input.utterance.trim());
        prompt.push_str("\n\nRESPUESTA:");
        prompt
    }

    fn persona(&self, user: &str) -> String {
        format!(
            "Eres {name}, un asistente virtual cercano y amigable para {user}.

REGLAS FUNDAMENTALES:
- Máximo {max} palabras por respuesta (muy importante)
- Usa un tono cercano pero respetuoso (no formal)
- Sé empática, clara y cálida
- Para temas de salud: sugiere consultar médico
- Si no entiendes, pide que repita

Tu objetivo es ser útil y hacer que {user} se sienta acompañada.",
            name = self.assistant_name,
            max = self.max_words,
        )
    }

    fn variables(&self, input: &PromptInput<'_>) -> HashMap<&'static str, String> {
        let prefs = input.preferences;
        let capabilities = prefs
            .capabilities
            .iter()
            .filter(|c| c.contains("control") || c.contains("dispositivo"))
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        HashMap::from([
            ("user_name", prefs.name.clone()),
            ("assistant_name", self.assistant_name.clone()),
            ("city", prefs.city.clone().unwrap_or_default()),
            ("age", prefs.age.map(|a| a.to_string()).unwrap_or_default()),
            ("plants", prefs.interests_for("plants")),
            ("cooking", prefs.interests_for("cooking")),
            ("pets", prefs.interests_for("pets")),
            ("entertainment", prefs.interests_for("entertainment")),
            ("music", prefs.interests_for("music")),
            ("topics", prefs.interests_for("topics")),
            ("current_time", input.temporal.time.clone()),
            ("day_period", input.temporal.period.label().to_string()),
            ("greeting", input.temporal.greeting.to_string()),
            (
                "capabilities",
                if capabilities.is_empty() {
                    "control básico de dispositivos".to_string()
                } else {
                    capabilities
                },
            ),
            (
                "confirmation_note",
                if prefs.confirm_actions {
                    "- Siempre confirma antes de ejecutar acciones".to_string()
                } else {
                    "- Ejecuta acciones directamente".to_string()
                },
            ),
        ])
    }

    fn adaptations(&self, prefs: &UserPreferenceSnapshot) -> String {
        let mut lines = Vec::new();
        if prefs.short_answers {
            lines.push(format!(
                "IMPORTANTE: Mantén respuestas MUY cortas (máximo {} palabras).",
                self.max_words
            ));
        }
        lines.push(
            if prefs.use_emojis {
                "Puedes usar emojis apropiados para adultos mayores."
            } else {
                "NO uses emojis en las respuestas."
            }
            .to_string(),
        );
        lines.push(
            match prefs.tone {
                ToneStyle::CloseRespectful => "Tono: Cercano pero respetuoso, como una buena amistad.",
                ToneStyle::Formal => "Tono: Formal y profesional.",
                ToneStyle::Affectionate => "Tono: Familiar y cariñoso.",
            }
            .to_string(),
        );
        if prefs.personal_references {
            lines.push("Incluye referencias personales cuando sea apropiado.".to_string());
        }
        bullet_section("ADAPTACIONES ESPECÍFICAS", &lines)
    }

    fn query_context(characteristics: &QueryCharacteristics) -> String {
        let mut lines = Vec::new();
        if let Some(kind) = characteristics.question_type.description() {
            lines.push(format!("Tipo: {kind}"));
        }
        if let Some(guidance) = characteristics.tone.guidance() {
            lines.push(guidance.to_string());
        }
        bullet_section("CONTEXTO DE LA CONSULTA", &lines)
    }

    fn memory_block(memory: &MemoryContext) -> String {
        format!(
            "\n\nCONTEXTO CONVERSACIONAL (hace {} min):
Usuario preguntó: \"{}\"
Yo respondí: \"{}\"

NOTA: La consulta actual parece relacionada ({}).
Usa este contexto para dar una respuesta coherente y conectada.",
            memory.minutes_ago, memory.last_query, memory.last_response, memory.reason
        )
    }
}

fn bullet_section(title: &str, lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let body: Vec<String> = lines.iter().map(|l| format!("- {l}")).collect();
    format!("\n\n{title}:\n{}", body.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis;
    use crate::conversation::MemoryReason;
    use chrono::NaiveDate;

    fn temporal() -> TemporalContext {
        TemporalContext::at(
            NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(10, 15, 0)
                .unwrap(),
        )
    }

    fn francisca() -> UserPreferenceSnapshot {
        let mut prefs = UserPreferenceSnapshot {
            name: "Francisca".into(),
            city: Some("Cuenca".into()),
            ..Default::default()
        };
        prefs
            .interests
            .insert("plants".into(), vec!["sábila".into(), "orquídeas".into()]);
        prefs
    }

    #[test]
    fn render_fills_known_and_blanks_unknown() {
        let vars = HashMap::from([("user_name", "Ana".to_string())]);
        assert_eq!(render("Hola {user_name}{nope}!", &vars), "Hola Ana!");
        assert_eq!(render("{ literal } {A}", &vars), "{ literal } {A}");
        assert_eq!(render("sin cierre {user_name", &vars), "sin cierre {user_name");
    }

    #[test]
    fn plants_prompt_is_personalized() {
        let builder = PromptBuilder::new("Vesta", 40);
        let text = "¿Cómo riego la sábila?";
        let chars = analysis::analyze(text);
        let temporal = temporal();
        let prefs = francisca();
        let prompt = builder.build(&PromptInput {
            utterance: text,
            classification: DomainClassification::new(Domain::Plants, 0.5),
            characteristics: &chars,
            temporal: &temporal,
            preferences: &prefs,
            memory: None,
        });

        assert!(prompt.starts_with("Eres Vesta, un asistente virtual cercano y amigable para Francisca."));
        assert!(prompt.contains("Máximo 40 palabras"));
        assert!(prompt.contains("- Le encantan las plantas: sábila, orquídeas"));
        assert!(prompt.contains("- Vive en Cuenca"));
        assert!(prompt.contains("NO uses emojis en las respuestas."));
        assert!(prompt.contains("Tono: Cercano pero respetuoso"));
        assert!(prompt.contains("- Tipo: pregunta sobre cómo"));
        assert!(!prompt.contains("CONTEXTO CONVERSACIONAL"));
        assert!(!prompt.contains('{'));
        assert!(prompt.ends_with("CONSULTA DEL USUARIO:\n¿Cómo riego la sábila?\n\nRESPUESTA:"));
    }

    #[test]
    fn memory_excerpt_is_included_when_present() {
        let builder = PromptBuilder::new("Vesta", 40);
        let chars = analysis::analyze("¿y eso?");
        let temporal = temporal();
        let prefs = UserPreferenceSnapshot::default();
        let memory = MemoryContext {
            minutes_ago: 1,
            last_query: "¿Cómo riego la sábila?".into(),
            last_response: "Poca agua.".into(),
            domain: Domain::Plants,
            reason: MemoryReason::ExplicitReference,
        };
        let prompt = builder.build(&PromptInput {
            utterance: "¿y eso?",
            classification: DomainClassification::fallback(),
            characteristics: &chars,
            temporal: &temporal,
            preferences: &prefs,
            memory: Some(&memory),
        });
        assert!(prompt.contains("CONTEXTO CONVERSACIONAL (hace 1 min):"));
        assert!(prompt.contains("Usuario preguntó: \"¿Cómo riego la sábila?\""));
        assert!(prompt.contains("(explicit_reference)"));
        assert!(prompt.contains("Consulta general para Usuario"));
    }

    #[test]
    fn preferences_change_adaptations() {
        let builder = PromptBuilder::new("Vesta", 25);
        let chars = analysis::analyze("hola");
        let temporal = temporal();
        let prefs = UserPreferenceSnapshot {
            tone: ToneStyle::Formal,
            use_emojis: true,
            short_answers: true,
            personal_references: false,
            ..Default::default()
        };
        let prompt = builder.build(&PromptInput {
            utterance: "hola",
            classification: DomainClassification::new(Domain::Conversational, 0.9),
            characteristics: &chars,
            temporal: &temporal,
            preferences: &prefs,
            memory: None,
        });
        assert!(prompt.contains("máximo 25 palabras"));
        assert!(prompt.contains("Puedes usar emojis"));
        assert!(prompt.contains("Tono: Formal y profesional."));
        assert!(!prompt.contains("referencias personales"));
        assert!(prompt.contains("Saludo apropiado: Buenos días"));
        assert!(!prompt.contains("CONTEXTO DE LA CONSULTA"));
    }
}
