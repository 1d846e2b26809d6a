use std::time::Duration;

use super::{
    is_translation_header,
    orient,
    require,
    text_of,
};
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
    watch::wait_for_fresh_element,
};

/// Walk the lesson scorecard and read every translation card.
///
/// Activating a card re-renders the shared answer region, so each card is
/// clicked and its answer awaited before the next one is touched. The text the
/// region shows before the click is stale unless the card repeats the one just
/// read, in which case the same answer is expected.
pub async fn extract_scorecard(
    page: &dyn Page,
    answer_timeout: Duration,
) -> Result<Vec<SentencePair>, DuoSyncError> {
    let card_count = page.query_all(selectors::SCORECARD_CARD).len();
    if card_count == 0 {
        return Err(DuoSyncError::missing("scorecard cards"));
    }

    let mut pairs = Vec::with_capacity(card_count);
    let mut last_read: Option<(String, String)> = None;

    for index in 0..card_count {
        // Cards are looked up again each round; the previous click re-rendered them.
        let Some(card) = page.query_all(selectors::SCORECARD_CARD).into_iter().nth(index) else {
            return Err(DuoSyncError::missing(format!("scorecard card {}", index + 1)));
        };

        let header = require(
            text_of(page.query_first_within(&card, selectors::CARD_HEADER)),
            "scorecard card header",
        )?;
        if !is_translation_header(&header) {
            log::debug!("Skipping card {}: {:?}", index + 1, header);
            continue;
        }

        let question = require(
            text_of(page.query_first_within(&card, selectors::CARD_QUESTION)),
            "scorecard card question",
        )?;

        let region = page.query(selectors::ANSWER_REGION);
        let shown = page.query(selectors::CARD_ANSWER).map(|answer| answer.text);
        let repeats_last = last_read.as_ref().is_some_and(|(h, q)| *h == header && *q == question);
        let stale = if repeats_last { None } else { shown.as_deref() };

        let since = page.revision();
        page.click(&card)?;
        let (scope, answer_selector) = match region.as_ref() {
            Some(region) => (Some(region), selectors::ANSWER_TEXT),
            None => (None, selectors::CARD_ANSWER),
        };
        let answer =
            wait_for_fresh_element(page, scope, answer_selector, since, stale, answer_timeout)
                .await?;
        let answer = clean_text(&answer.text);
        if answer.is_empty() {
            return Err(DuoSyncError::missing(format!("answer for card {}", index + 1)));
        }

        pairs.push(orient(&header, &question, &answer));
        last_read = Some((header, question));
    }

    log::info!("Read {} sentence pairs from {} scorecard cards", pairs.len(), card_count);
    Ok(pairs)
}
