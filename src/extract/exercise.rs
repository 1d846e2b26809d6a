use super::{
    first_success,
    orient,
    pick_second_or_first,
    require,
    text_of,
    Strategy,
};
use crate::{
    core::{
        text::{
            clean_reconstructed,
            clean_text,
            fill_blank,
            join_tokens,
        },
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

/// Which single exercise is on screen, if it has been checked (a result panel
/// is showing). Returns the exercise container alongside.
pub fn classify_exercise(page: &dyn Page) -> Option<(ExerciseState, Element)> {
    page.query(selectors::BLAME)?;

    if let Some(challenge) = page.query(selectors::CHALLENGE_SELECT_MISSING) {
        return Some((ExerciseState::SelectMissingWord, challenge));
    }
    if let Some(challenge) = page.query(selectors::CHALLENGE_TYPE_MISSING) {
        return Some((ExerciseState::TypeMissingWord, challenge));
    }
    if let Some(challenge) = page.query(selectors::CHALLENGE_LISTEN_TAP) {
        return Some((ExerciseState::ListenTap, challenge));
    }
    if let Some(challenge) = page.query(selectors::CHALLENGE_TRANSLATE) {
        let word_bank = page.query_first_within(&challenge, selectors::WORD_BANK).is_some()
            || page.query_first_within(&challenge, selectors::ANSWER_TILES).is_some();
        let state = if word_bank {
            ExerciseState::TranslateWordBank
        } else {
            ExerciseState::TranslateTextarea
        };
        return Some((state, challenge));
    }

    log::debug!("Result panel without a recognized exercise");
    None
}

fn blame_solution(page: &dyn Page, panel: &str) -> Option<String> {
    let panel = page.query(panel)?;
    text_of(page.query_first_within(&panel, selectors::BLAME_SOLUTION))
}

fn incorrect_solution(page: &dyn Page, _challenge: &Element) -> Option<String> {
    blame_solution(page, selectors::BLAME_INCORRECT)
}

fn correct_solution(page: &dyn Page, _challenge: &Element) -> Option<String> {
    blame_solution(page, selectors::BLAME_CORRECT)
}

fn typed_input(page: &dyn Page, challenge: &Element) -> Option<String> {
    let input = page.query_first_within(challenge, selectors::TEXT_INPUT)?;
    input.value.map(|value| clean_reconstructed(&value))
}

fn tapped_tiles(page: &dyn Page, challenge: &Element) -> Option<String> {
    let tiles = page.query_within(challenge, selectors::ANSWER_TILES);
    Some(join_tokens(tiles.iter().map(|tile| tile.text.as_str())))
}

fn completed_line(page: &dyn Page, challenge: &Element) -> Option<String> {
    let line = pick_second_or_first(page.query_within(challenge, selectors::SENTENCE_LINE))?;
    Some(clean_reconstructed(&line.text))
}

fn selected_choice(page: &dyn Page, challenge: &Element) -> Option<String> {
    let choice = page.query_first_within(challenge, selectors::CHOICE_SELECTED)?;
    let label = page.query_first_within(&choice, selectors::CHOICE_TEXT).unwrap_or(choice);
    text_of(Some(label))
}

const TRANSLATE_TEXTAREA: &[Strategy] = &[
    Strategy { name: "incorrect-solution", run: incorrect_solution },
    Strategy { name: "correct-solution", run: correct_solution },
    Strategy { name: "typed-input", run: typed_input },
];

const TRANSLATE_WORD_BANK: &[Strategy] = &[
    Strategy { name: "incorrect-solution", run: incorrect_solution },
    Strategy { name: "correct-solution", run: correct_solution },
    Strategy { name: "tapped-tiles", run: tapped_tiles },
];

const TYPE_MISSING_WORD: &[Strategy] = &[
    Strategy { name: "incorrect-solution", run: incorrect_solution },
    Strategy { name: "correct-solution", run: correct_solution },
    Strategy { name: "completed-line", run: completed_line },
];

const LISTEN_TAP: &[Strategy] = &[
    Strategy { name: "incorrect-solution", run: incorrect_solution },
    Strategy { name: "correct-solution", run: correct_solution },
    Strategy { name: "tapped-tiles", run: tapped_tiles },
];

const SELECT_MISSING_WORD: &[Strategy] = &[
    Strategy { name: "incorrect-solution", run: incorrect_solution },
    Strategy { name: "correct-solution", run: correct_solution },
    Strategy { name: "selected-choice", run: selected_choice },
];

/// Answer fallback order for `state`, most trusted first.
pub fn strategies_for(state: ExerciseState) -> &'static [Strategy] {
    match state {
        ExerciseState::TranslateTextarea => TRANSLATE_TEXTAREA,
        ExerciseState::TranslateWordBank => TRANSLATE_WORD_BANK,
        ExerciseState::TypeMissingWord => TYPE_MISSING_WORD,
        ExerciseState::ListenTap => LISTEN_TAP,
        ExerciseState::SelectMissingWord => SELECT_MISSING_WORD,
        ExerciseState::ReviewScorecard | ExerciseState::Story => &[],
    }
}

fn header_text(page: &dyn Page, challenge: &Element) -> String {
    page.query_first_within(challenge, selectors::CHALLENGE_HEADER)
        .or_else(|| page.query(selectors::CHALLENGE_HEADER))
        .map(|header| clean_text(&header.text))
        .unwrap_or_default()
}

fn answer_for(
    page: &dyn Page,
    state: ExerciseState,
    challenge: &Element,
) -> Result<String, DuoSyncError> {
    first_success(strategies_for(state), page, challenge)
        .map(|(_, answer)| answer)
        .ok_or_else(|| DuoSyncError::missing(format!("answer for {} exercise", state)))
}

/// Read one checked single exercise.
pub fn extract_exercise(
    page: &dyn Page,
    state: ExerciseState,
    challenge: &Element,
) -> Result<SentencePair, DuoSyncError> {
    match state {
        ExerciseState::TranslateTextarea | ExerciseState::TranslateWordBank => {
            let header = header_text(page, challenge);
            let visible = require(
                text_of(page.query_first_within(challenge, selectors::PROMPT_SENTENCE)),
                "translation prompt",
            )?;
            let answer = answer_for(page, state, challenge)?;
            Ok(orient(&header, &visible, &answer))
        }
        ExerciseState::TypeMissingWord => {
            let lines = page.query_within(challenge, selectors::SENTENCE_LINE);
            let prompt = if lines.len() >= 2 {
                text_of(lines.into_iter().next())
            } else {
                text_of(page.query_first_within(challenge, selectors::PROMPT_SENTENCE))
            };
            let visible = require(prompt, "missing-word prompt")?;
            let header = header_text(page, challenge);
            let answer = answer_for(page, state, challenge)?;
            Ok(orient(&header, &visible, &answer))
        }
        ExerciseState::ListenTap => {
            let transcription = answer_for(page, state, challenge)?;
            // With a meaning line the panel lists [transcription, meaning].
            let meaning = page
                .query(selectors::BLAME)
                .map(|panel| page.query_within(&panel, selectors::BLAME_SOLUTION))
                .filter(|solutions| solutions.len() >= 2)
                .and_then(|solutions| text_of(pick_second_or_first(solutions)));
            let question = meaning.unwrap_or_else(|| transcription.clone());
            Ok(SentencePair::new(question, transcription))
        }
        ExerciseState::SelectMissingWord => {
            let template = page
                .query_first_within(challenge, selectors::GAP_TEMPLATE)
                .map(|template| clean_text(&template.text));
            let template = require(template.filter(|t| !t.is_empty()), "gap-fill template")?;
            let word = answer_for(page, state, challenge)?;
            let answer = fill_blank(&template, &word)
                .ok_or_else(|| DuoSyncError::missing("blank in gap-fill template"))?;
            Ok(SentencePair::new(template, answer))
        }
        ExerciseState::ReviewScorecard | ExerciseState::Story => Err(DuoSyncError::Custom(
            format!("{} is not a single exercise", state),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::SnapshotPage;

    fn checked(challenge: &str, blame: &str) -> SnapshotPage {
        SnapshotPage::new(format!("<html><body>{}{}</body></html>", challenge, blame))
    }

    const TRANSLATE_TYPED: &str = r#"
        <div data-test="challenge challenge-translate">
          <h1 data-test="challenge-header"><span>Write this in English</span></h1>
          <div data-test="hint-sentence">Noi
            mangiamo   i biscotti</div>
          <textarea data-test="challenge-translate-input">We eat the biscuits .</textarea>
        </div>"#;

    const BLAME_INCORRECT: &str = r#"
        <div data-test="blame blame-incorrect">
          <h2>Correct solution:</h2>
          <div data-test="blame-solution">We eat the cookies.</div>
        </div>"#;

    const BLAME_CORRECT: &str = r#"<div data-test="blame blame-correct"><h2>Nice!</h2></div>"#;

    #[test]
    fn test_no_result_panel_is_not_classified() {
        let page = checked(TRANSLATE_TYPED, "");
        assert!(classify_exercise(&page).is_none());
    }

    #[test]
    fn test_translate_prefers_incorrect_solution() {
        let page = checked(TRANSLATE_TYPED, BLAME_INCORRECT);
        let (state, challenge) = classify_exercise(&page).unwrap();
        assert_eq!(state, ExerciseState::TranslateTextarea);

        let pair = extract_exercise(&page, state, &challenge).unwrap();
        assert_eq!(pair, SentencePair::new("We eat the cookies.", "Noi mangiamo i biscotti"));
    }

    #[test]
    fn test_translate_falls_back_to_typed_input() {
        let page = checked(TRANSLATE_TYPED, BLAME_CORRECT);
        let (state, challenge) = classify_exercise(&page).unwrap();
        let pair = extract_exercise(&page, state, &challenge).unwrap();
        assert_eq!(pair, SentencePair::new("We eat the biscuits.", "Noi mangiamo i biscotti"));
    }

    #[test]
    fn test_word_bank_into_target_language() {
        let challenge = r#"
            <div data-test="challenge challenge-translate">
              <h1 data-test="challenge-header">Write this in Italian</h1>
              <div data-test="hint-sentence">You drink water.</div>
              <div data-test="answer-tiles">
                <button data-test="challenge-tap-token">Tu</button>
                <button data-test="challenge-tap-token">bevi</button>
                <button data-test="challenge-tap-token">acqua</button>
                <button data-test="challenge-tap-token">.</button>
              </div>
              <div data-test="word-bank"><button>vino</button></div>
            </div>"#;
        let page = checked(challenge, BLAME_CORRECT);
        let (state, element) = classify_exercise(&page).unwrap();
        assert_eq!(state, ExerciseState::TranslateWordBank);

        let pair = extract_exercise(&page, state, &element).unwrap();
        assert_eq!(pair, SentencePair::new("You drink water.", "Tu bevi acqua."));
    }

    #[test]
    fn test_type_missing_word_reads_second_line() {
        let challenge = r#"
            <div data-test="challenge challenge-completeReverseTranslation">
              <div data-test="challenge-sentence">I have a beautiful daughter.</div>
              <div data-test="challenge-sentence">Ho una <input data-test="challenge-text-input" value="bella"> figlia.</div>
            </div>"#;
        let page = checked(challenge, BLAME_CORRECT);
        let (state, element) = classify_exercise(&page).unwrap();
        assert_eq!(state, ExerciseState::TypeMissingWord);

        let pair = extract_exercise(&page, state, &element).unwrap();
        assert_eq!(
            pair,
            SentencePair::new("I have a beautiful daughter.", "Ho una bella figlia.")
        );
    }

    #[test]
    fn test_listen_tap_uses_meaning_when_shown() {
        let challenge = r#"<div data-test="challenge challenge-listenTap"></div>"#;
        let blame = r#"
            <div data-test="blame blame-incorrect">
              <div data-test="blame-solution">Il gatto dorme.</div>
              <div data-test="blame-solution">The cat sleeps.</div>
            </div>"#;
        let page = checked(challenge, blame);
        let (state, element) = classify_exercise(&page).unwrap();
        assert_eq!(state, ExerciseState::ListenTap);

        let pair = extract_exercise(&page, state, &element).unwrap();
        assert_eq!(pair, SentencePair::new("The cat sleeps.", "Il gatto dorme."));
    }

    #[test]
    fn test_select_missing_word_fills_template() {
        let challenge = r#"
            <div data-test="challenge challenge-gapFill">
              <div data-test="challenge-gap-template">Ho un'___ figlia</div>
              <div data-test="challenge-choice" aria-checked="false"><span data-test="challenge-judge-text">brutta</span></div>
              <div data-test="challenge-choice" aria-checked="true"><span data-test="challenge-judge-text">bella</span></div>
            </div>"#;
        let page = checked(challenge, BLAME_CORRECT);
        let (state, element) = classify_exercise(&page).unwrap();
        assert_eq!(state, ExerciseState::SelectMissingWord);

        let pair = extract_exercise(&page, state, &element).unwrap();
        assert_eq!(pair, SentencePair::new("Ho un'___ figlia", "Ho un'bella figlia"));
    }

    #[test]
    fn test_missing_prompt_is_missing_data() {
        let challenge = r#"
            <div data-test="challenge challenge-translate">
              <h1 data-test="challenge-header">Write this in Italian</h1>
              <textarea data-test="challenge-translate-input">Tu bevi</textarea>
            </div>"#;
        let page = checked(challenge, BLAME_CORRECT);
        let (state, element) = classify_exercise(&page).unwrap();
        let result = extract_exercise(&page, state, &element);
        assert!(matches!(result, Err(DuoSyncError::MissingData(_))));
    }

    #[test]
    fn test_re_extraction_is_stable() {
        let page = checked(TRANSLATE_TYPED, BLAME_INCORRECT);
        let (state, challenge) = classify_exercise(&page).unwrap();
        let first = extract_exercise(&page, state, &challenge).unwrap();
        let second = extract_exercise(&page, state, &challenge).unwrap();
        assert_eq!(first, second);
    }
}
