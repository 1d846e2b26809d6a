use std::collections::HashSet;

use crate::core::{
    text::clean_text,
    SentencePair,
};

/// Normalize and drop repeated pairs, keeping first occurrences in order.
/// The key is the whole pair, not just the question.
pub fn dedup_pairs(pairs: &[SentencePair]) -> Vec<SentencePair> {
    let mut seen = HashSet::new();
    pairs
        .iter()
        .map(|pair| SentencePair::new(clean_field(&pair.question), clean_field(&pair.answer)))
        .filter(|pair| seen.insert(pair.clone()))
        .collect()
}

/// Tabs would break the column layout.
fn clean_field(field: &str) -> String {
    clean_text(&field.replace('\t', " "))
}

/// One `question<TAB>answer` line per unique pair.
pub fn to_tsv(pairs: &[SentencePair]) -> String {
    dedup_pairs(pairs)
        .iter()
        .map(|pair| format!("{}\t{}", pair.question, pair.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The text shown to the user after a cycle: sync count when there is one,
/// then the TSV block.
pub fn result_message(added_count: Option<usize>, export_text: &str) -> String {
    let mut message = String::new();
    if let Some(count) = added_count {
        message.push_str(&format!(
            "{} sentences were synced to Anki (already existing notes are skipped).\n\n",
            count
        ));
    }
    message.push_str(&format!("All extracted sentences in TSV format:\n```\n{}\n```", export_text));
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<SentencePair> {
        items.iter().map(|&item| item.into()).collect()
    }

    #[test]
    fn test_duplicate_pair_collapses_in_first_occurrence_order() {
        let input = pairs(&[
            ("Noi mangiamo", "We eat"),
            ("Noi mangiamo", "We eat"),
            ("Tu bevi", "You drink"),
        ]);
        let tsv = to_tsv(&input);
        assert_eq!(tsv, "Noi mangiamo\tWe eat\nTu bevi\tYou drink");
        assert_eq!(tsv.lines().count(), input.len() - 1);
    }

    #[test]
    fn test_dedup_key_is_the_whole_pair() {
        let input = pairs(&[("Ciao", "Hi"), ("Ciao", "Hello"), ("Ciao", "Hi")]);
        assert_eq!(to_tsv(&input), "Ciao\tHi\nCiao\tHello");
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let input = pairs(&[("a\nb   c", "x"), ("a b c", "x"), ("y", "z")]);
        let once = to_tsv(&input);
        assert_eq!(to_tsv(&input), once);
        // whitespace variants normalize to the same pair
        assert_eq!(once, "a b c\tx\ny\tz");
        assert_eq!(dedup_pairs(&dedup_pairs(&input)), dedup_pairs(&input));
    }

    #[test]
    fn test_tabs_inside_fields_are_flattened() {
        let input = pairs(&[("a\tb", "c")]);
        assert_eq!(to_tsv(&input), "a b\tc");
    }

    #[test]
    fn test_result_message() {
        let message = result_message(Some(2), "a\tb");
        assert!(message.starts_with("2 sentences were synced to Anki"));
        assert!(message.ends_with("```\na\tb\n```"));

        let export_only = result_message(None, "a\tb");
        assert!(export_only.starts_with("All extracted sentences in TSV format:"));
    }
}
