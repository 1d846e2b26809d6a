//! CSS selectors for the host application's DOM.
//!
//! The review and story selectors target obfuscated class names that change
//! with host releases; update them here when a watch stops matching.

// Lesson end: review button and scorecard
pub const REVIEW_BUTTON: &str = "button.WOZnx._275sd._1ZefG._2ugbF.U1P3s._40EaN span";
pub const REVIEW_BUTTON_TEXT: &str = "review lesson";
pub const LEARN_NAV: &str = "a[data-test=home-nav] span._288DZ";
pub const LEARN_NAV_TEXT: &str = "learn";

// correct cards (green): "._2eeKH._2TVVG._32YlO"
// incorrect cards (red): "._2eeKH._2TVVG.lk2xf"
pub const SCORECARD_CARD: &str = "._2eeKH._2TVVG";
pub const CARD_HEADER: &str = "._3WHhh";
pub const CARD_QUESTION: &str = ".UWDnp";
/// Shared answer region; replaced every time a card is activated.
pub const ANSWER_REGION: &str = "._1MehU";
pub const ANSWER_TEXT: &str = "._21MzE";
pub const CARD_ANSWER: &str = "._1MehU ._21MzE";
pub const SCORECARD_CLOSE: &str =
    "._1hEOp._13Rl7._3lUbm._18W4a.xtPuL .FrL-W[data-test=close-button]";

pub const PLAYER_NEXT: &str = "button[data-test=player-next] span";
pub const CONTINUE_TEXT: &str = "continue";

// Stories
pub const STORY_LINE: &str =
    "._3sNGF._3j32v[data-test=stories-element] ._3jGFa._1e1GW._2lvkY";

// Single exercises
pub const CHALLENGE: &str = "[data-test~=challenge]";
pub const CHALLENGE_TRANSLATE: &str = "[data-test~=challenge-translate]";
pub const CHALLENGE_TYPE_MISSING: &str = "[data-test~=challenge-completeReverseTranslation]";
pub const CHALLENGE_LISTEN_TAP: &str = "[data-test~=challenge-listenTap]";
pub const CHALLENGE_SELECT_MISSING: &str = "[data-test~=challenge-gapFill]";

pub const CHALLENGE_HEADER: &str = "[data-test=challenge-header]";
pub const PROMPT_SENTENCE: &str = "[data-test=hint-sentence]";
pub const TEXT_INPUT: &str = "textarea[data-test=challenge-translate-input]";
pub const WORD_BANK: &str = "[data-test=word-bank]";
pub const ANSWER_TILES: &str = "[data-test=answer-tiles] [data-test=challenge-tap-token]";

/// Sentence lines of a type-the-missing-word exercise; the prompt comes first.
pub const SENTENCE_LINE: &str = "[data-test=challenge-sentence]";
pub const GAP_TEMPLATE: &str = "[data-test=challenge-gap-template]";
pub const CHOICE_SELECTED: &str = "[data-test=challenge-choice][aria-checked=true]";
pub const CHOICE_TEXT: &str = "[data-test=challenge-judge-text]";

// Result panel shown after "Check"
pub const BLAME: &str = "[data-test~=blame]";
pub const BLAME_CORRECT: &str = "[data-test~=blame-correct]";
pub const BLAME_INCORRECT: &str = "[data-test~=blame-incorrect]";
pub const BLAME_SOLUTION: &str = "[data-test=blame-solution]";

// Challenge headers read "Write this in English" (older cards: "Write in English:")
pub const WRITE_PREFIXES: &[&str] = &["write in ", "write this in "];
pub const ENGLISH_MARKER: &str = "in english";
