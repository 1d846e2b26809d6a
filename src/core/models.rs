use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// A question/answer sentence pair extracted for flashcard creation.
///
/// `question` is always the given text and `answer` the expected text, whatever
/// the language direction of the exercise it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SentencePair {
    pub question: String,
    pub answer: String,
}

impl SentencePair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { question: question.into(), answer: answer.into() }
    }
}

impl From<(&str, &str)> for SentencePair {
    fn from((question, answer): (&str, &str)) -> Self {
        Self::new(question, answer)
    }
}

/// Which screen the host application is showing, inferred from DOM markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseState {
    ReviewScorecard,
    TranslateTextarea,
    TranslateWordBank,
    TypeMissingWord,
    ListenTap,
    SelectMissingWord,
    Story,
}

impl ExerciseState {
    /// Single exercises are extracted one screen at a time; the other two walk a list.
    pub fn is_single_exercise(&self) -> bool {
        !matches!(self, ExerciseState::ReviewScorecard | ExerciseState::Story)
    }
}

impl fmt::Display for ExerciseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExerciseState::ReviewScorecard => "review scorecard",
            ExerciseState::TranslateTextarea => "translate (typed)",
            ExerciseState::TranslateWordBank => "translate (word bank)",
            ExerciseState::TypeMissingWord => "type the missing word",
            ExerciseState::ListenTap => "listen and tap",
            ExerciseState::SelectMissingWord => "select the missing word",
            ExerciseState::Story => "story",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    /// Present only when the flashcard service was reachable and accepted the batch.
    pub added_count: Option<usize>,
    pub export_text: String,
}
