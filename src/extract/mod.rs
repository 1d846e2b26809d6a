//! Pull sentence pairs out of the host page, one module per screen shape.
//!
//! Single exercises resolve their answer through an ordered list of
//! [`Strategy`] values; the first one that yields text wins.

pub mod exercise;
pub mod review;
pub mod story;

use std::time::Duration;

pub use exercise::classify_exercise;

use crate::{
    core::{
        text::clean_text,
        DuoSyncError,
        ExerciseState,
        SentencePair,
    },
    page::{
        selectors,
        Element,
        Page,
    },
};

/// One way of finding a piece of text for an exercise.
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&dyn Page, &Element) -> Option<String>,
}

/// Run `strategies` in order against `challenge`; first non-empty result wins.
pub fn first_success(
    strategies: &[Strategy],
    page: &dyn Page,
    challenge: &Element,
) -> Option<(&'static str, String)> {
    strategies.iter().find_map(|strategy| {
        let found = (strategy.run)(page, challenge).filter(|text| !text.is_empty())?;
        log::debug!("Strategy {} matched: {:?}", strategy.name, found);
        Some((strategy.name, found))
    })
}

/// Header texts like "Write this in Italian" / "Write this in English".
pub fn is_translation_header(header: &str) -> bool {
    let header = header.trim().to_lowercase();
    selectors::WRITE_PREFIXES.iter().any(|prefix| header.starts_with(prefix))
}

pub fn targets_english(header: &str) -> bool {
    header.to_lowercase().contains(selectors::ENGLISH_MARKER)
}

/// Orient a pair so the card front is always the English side.
///
/// When the header asks for English, the visible sentence is the foreign one
/// and belongs on the back.
pub fn orient(header: &str, visible: &str, answer: &str) -> SentencePair {
    if targets_english(header) {
        SentencePair::new(answer, visible)
    } else {
        SentencePair::new(visible, answer)
    }
}

/// Precondition shared by the "type the missing word" and "listen and tap"
/// shapes: with two or more matches the second one is the one to read,
/// otherwise the only one.
pub fn pick_second_or_first(mut elements: Vec<Element>) -> Option<Element> {
    if elements.len() >= 2 {
        Some(elements.swap_remove(1))
    } else {
        elements.into_iter().next()
    }
}

pub(crate) fn text_of(element: Option<Element>) -> Option<String> {
    element.map(|e| clean_text(&e.text)).filter(|text| !text.is_empty())
}

pub(crate) fn require(text: Option<String>, what: &str) -> Result<String, DuoSyncError> {
    text.ok_or_else(|| DuoSyncError::missing(what.to_string()))
}

/// Extract every pair available for `state`.
///
/// Review and story extraction walk their whole list; single exercises yield
/// one pair read from `challenge` (found again if not supplied).
pub async fn extract(
    page: &dyn Page,
    state: ExerciseState,
    challenge: Option<&Element>,
    answer_timeout: Duration,
) -> Result<Vec<SentencePair>, DuoSyncError> {
    match state {
        ExerciseState::ReviewScorecard => review::extract_scorecard(page, answer_timeout).await,
        ExerciseState::Story => story::extract_story(page),
        single => {
            let challenge = match challenge {
                Some(challenge) => challenge.clone(),
                None => page
                    .query(selectors::CHALLENGE)
                    .ok_or_else(|| DuoSyncError::missing("exercise container"))?,
            };
            let pair = exercise::extract_exercise(page, single, &challenge)?;
            Ok(vec![pair])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ElementPath;

    fn element(text: &str) -> Element {
        Element {
            path: ElementPath::root("p", 0),
            tag: "p".to_string(),
            text: text.to_string(),
            value: None,
            attrs: Vec::new(),
        }
    }

    #[test]
    fn test_orient_english_header_puts_answer_first() {
        let pair = orient("Write this in English", "Noi mangiamo", "We eat");
        assert_eq!(pair, SentencePair::new("We eat", "Noi mangiamo"));

        let pair = orient("Write in English:", "Noi mangiamo", "We eat");
        assert_eq!(pair, SentencePair::new("We eat", "Noi mangiamo"));
    }

    #[test]
    fn test_orient_other_language_keeps_visible_first() {
        let pair = orient("Write this in Italian", "We eat", "Noi mangiamo");
        assert_eq!(pair, SentencePair::new("We eat", "Noi mangiamo"));
    }

    #[test]
    fn test_translation_header() {
        assert!(is_translation_header("Write this in Italian"));
        assert!(is_translation_header("  write in English:"));
        assert!(!is_translation_header("Select the correct meaning"));
        assert!(!is_translation_header("Write the missing word"));
        assert!(!is_translation_header("Write what you hear"));
    }

    #[test]
    fn test_pick_second_or_first() {
        let three = vec![element("a"), element("b"), element("c")];
        assert_eq!(pick_second_or_first(three).unwrap().text, "b");
        assert_eq!(pick_second_or_first(vec![element("a")]).unwrap().text, "a");
        assert!(pick_second_or_first(Vec::new()).is_none());
    }

    #[test]
    fn test_first_success_order() {
        let page = crate::page::SnapshotPage::empty();
        let challenge = element("x");
        let strategies = [
            Strategy { name: "none", run: |_, _| None },
            Strategy { name: "empty", run: |_, _| Some(String::new()) },
            Strategy { name: "first", run: |_, _| Some("one".to_string()) },
            Strategy { name: "second", run: |_, _| Some("two".to_string()) },
        ];
        assert_eq!(
            first_success(&strategies, &page, &challenge),
            Some(("first", "one".to_string()))
        );
        assert_eq!(first_success(&strategies[..2], &page, &challenge), None);
    }
}
