//! Text folding and term matching shared by every lookup table.
//!
//! All tables are compared on *folded* text: lowercase with Spanish
//! diacritics removed, so "Qué" and "que" are the same key. Terms are matched
//! on word boundaries, never as substrings of longer words ("eso" must not
//! match "queso").

/// Strip the diacritics that appear in Spanish and common loanwords.
fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Lowercase and remove diacritics. Punctuation and spacing are preserved.
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(fold_char)
        .collect()
}

/// Split folded text into alphanumeric words.
pub fn words(folded: &str) -> Vec<&str> {
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whether `term` (folded, one or more words) occurs in `tokens` as a whole
/// word or a contiguous word sequence.
pub fn contains_term(tokens: &[&str], term: &str) -> bool {
    let needle = words(term);
    match needle.len() {
        0 => false,
        1 => tokens.contains(&needle[0]),
        n => tokens.windows(n).any(|w| w == needle.as_slice()),
    }
}

/// Whether `tokens` begins with the words of `term`.
pub fn starts_with_term(tokens: &[&str], term: &str) -> bool {
    let needle = words(term);
    !needle.is_empty() && tokens.starts_with(&needle)
}

/// First term of `terms` found in `tokens`.
pub fn find_term<'t>(tokens: &[&str], terms: &[&'t str]) -> Option<&'t str> {
    terms.iter().copied().find(|t| contains_term(tokens, &fold(t)))
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Cut to `max_chars`, replacing the tail with "..." when it does not fit.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    format!("{}...", truncate_chars(text, keep))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_removes_accents_and_case() {
        assert_eq!(fold("¿Qué HORA es?"), "¿que hora es?");
        assert_eq!(fold("Mañana, sábila, pingüino"), "manana, sabila, pinguino");
    }

    #[test]
    fn words_split_on_punctuation() {
        let folded = fold("¡Hola, ¿cómo estás?");
        assert_eq!(words(&folded), vec!["hola", "como", "estas"]);
    }

    #[test]
    fn term_matching_respects_word_boundaries() {
        let folded = fold("quiero queso fresco");
        let tokens = words(&folded);
        assert!(!contains_term(&tokens, "eso"));
        assert!(contains_term(&tokens, "queso"));
        assert!(contains_term(&tokens, "queso fresco"));
        assert!(!contains_term(&tokens, "fresco queso"));
    }

    #[test]
    fn starts_with_multiword() {
        let folded = fold("cómo preparar un locro");
        let tokens = words(&folded);
        assert!(starts_with_term(&tokens, "como preparar"));
        assert!(!starts_with_term(&tokens, "locro"));
    }

    #[test]
    fn find_term_folds_candidates() {
        let folded = fold("Necesito más información");
        let tokens = words(&folded);
        assert_eq!(
            find_term(&tokens, &["dime más", "más información"]),
            Some("más información")
        );
    }

    #[test]
    fn excerpt_adds_ellipsis() {
        let long = "a".repeat(150);
        let cut = excerpt(&long, 100);
        assert_eq!(cut.chars().count(), 100);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("corto", 100), "corto");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate_chars("ñandú", 3), "ñan");
        assert_eq!(truncate_chars("sol", 10), "sol");
    }
}
