use std::sync::OnceLock;

use regex::Regex;

fn wide_spaces() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {3,}").unwrap())
}

fn space_before_terminal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+([.!?])").unwrap())
}

fn blank_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_{2,}").unwrap())
}

/// Collapse newlines to single spaces and runs of three or more spaces to one.
///
/// Idempotent: `clean_text(clean_text(s)) == clean_text(s)`.
pub fn clean_text(text: &str) -> String {
    let joined = text
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    wide_spaces().replace_all(&joined, " ").trim().to_string()
}

/// Cleanup for answers rebuilt from word tiles or inputs, which render
/// `"Noi mangiamo ."` style gaps before the closing punctuation.
pub fn clean_reconstructed(text: &str) -> String {
    let cleaned = clean_text(text);
    space_before_terminal().replace_all(&cleaned, "$1").into_owned()
}

/// Replace the first run of two or more underscores in `template` with `word`.
/// Returns `None` when the template has no blank.
pub fn fill_blank(template: &str, word: &str) -> Option<String> {
    let blank = blank_run().find(template)?;
    let mut filled = String::with_capacity(template.len() + word.len());
    filled.push_str(&template[..blank.start()]);
    filled.push_str(word);
    filled.push_str(&template[blank.end()..]);
    Some(filled)
}

/// Join tapped word tiles into a sentence.
pub fn join_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    let joined =
        tokens.into_iter().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join(" ");
    clean_reconstructed(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_newlines_and_spaces() {
        assert_eq!(clean_text("a\nb   c"), "a b c");
        assert_eq!(clean_text("a b c"), "a b c");
        assert_eq!(clean_text("  Noi\n\nmangiamo  "), "Noi mangiamo");
        // two spaces are left alone, only runs of three or more collapse
        assert_eq!(clean_text("a  b"), "a  b");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        for input in ["a\nb   c", "Tu\r\nbevi    l'acqua .", "   ", "x\n\n\ny"] {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_clean_reconstructed_removes_space_before_punctuation() {
        assert_eq!(clean_reconstructed("We eat the biscuits ."), "We eat the biscuits.");
        assert_eq!(clean_reconstructed("Are you ok ?"), "Are you ok?");
        assert_eq!(clean_reconstructed("Yes !"), "Yes!");
        assert_eq!(clean_reconstructed("No change."), "No change.");
    }

    #[test]
    fn test_fill_blank_replaces_first_run_only() {
        assert_eq!(fill_blank("Ho un'___ figlia", "bella").as_deref(), Some("Ho un'bella figlia"));
        assert_eq!(fill_blank("__ e ____", "uno").as_deref(), Some("uno e ____"));
        // a single underscore is not a blank
        assert_eq!(fill_blank("snake_case __", "x").as_deref(), Some("snake_case x"));
        assert_eq!(fill_blank("no blank here", "x"), None);
    }

    #[test]
    fn test_join_tokens() {
        assert_eq!(join_tokens(["We", "eat", " ", "bread", "."]), "We eat bread.");
        assert_eq!(join_tokens(Vec::<&str>::new()), "");
    }
}
