use crate::{
    core::{
        text::clean_text,
        DuoSyncError,
        SentencePair,
    },
    page::{
        selectors,
        Page,
    },
};

/// Read every dialogue line of the story on screen.
///
/// Stories carry no translation in the page, so each line becomes both sides
/// of its pair and is tagged for later translation by the caller.
pub fn extract_story(page: &dyn Page) -> Result<Vec<SentencePair>, DuoSyncError> {
    let pairs: Vec<SentencePair> = page
        .query_all(selectors::STORY_LINE)
        .iter()
        .map(|line| clean_text(&line.text))
        .filter(|line| !line.is_empty())
        .map(|line| SentencePair::new(line.clone(), line))
        .collect();

    if pairs.is_empty() {
        return Err(DuoSyncError::missing("story lines"));
    }

    log::info!("Read {} story lines", pairs.len());
    Ok(pairs)
}
