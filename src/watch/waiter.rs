use std::time::Duration;

use crate::{
    core::DuoSyncError,
    page::{
        Element,
        Page,
    },
};

/// Resolve with the first element matching `selector`, inside `scope` when
/// given. Resolves at once if it already exists; otherwise re-checks on every
/// structural change. The change subscription is dropped on return.
pub async fn wait_for_element<P: Page + ?Sized>(
    page: &P,
    scope: Option<&Element>,
    selector: &str,
) -> Result<Element, DuoSyncError> {
    let mut changes = page.changes();
    loop {
        if let Some(found) = page.find(scope, selector).into_iter().next() {
            return Ok(found);
        }
        changes.changed().await.map_err(|_| DuoSyncError::PageClosed)?;
    }
}

/// [`wait_for_element`] bounded by `timeout`; running out is missing data.
pub async fn wait_for_element_timeout<P: Page + ?Sized>(
    page: &P,
    scope: Option<&Element>,
    selector: &str,
    timeout: Duration,
) -> Result<Element, DuoSyncError> {
    match tokio::time::timeout(timeout, wait_for_element(page, scope, selector)).await {
        Ok(result) => result,
        Err(_) => Err(DuoSyncError::missing(format!("{} did not appear", selector))),
    }
}

/// Wait for `selector` as re-rendered after revision `since`.
///
/// Used after a click that makes the host re-render a shared region: at
/// `since` the region may still hold the previous item's content. A match whose
/// text equals `stale` is that content and is skipped, even in a newer
/// revision. Running out of time while the stale text is still shown is
/// missing data. With no `stale` text, whatever is present on timeout is taken.
pub async fn wait_for_fresh_element<P: Page + ?Sized>(
    page: &P,
    scope: Option<&Element>,
    selector: &str,
    since: u64,
    stale: Option<&str>,
    timeout: Duration,
) -> Result<Element, DuoSyncError> {
    let is_stale = |found: &Element| stale == Some(found.text.as_str());

    let mut changes = page.changes();
    let fresh = async {
        loop {
            if page.revision() > since {
                if let Some(found) = page.find(scope, selector).into_iter().next() {
                    if !is_stale(&found) {
                        return Ok(found);
                    }
                }
            }
            changes.changed().await.map_err(|_| DuoSyncError::PageClosed)?;
        }
    };

    match tokio::time::timeout(timeout, fresh).await {
        Ok(result) => result,
        Err(_) => match page.find(scope, selector).into_iter().next() {
            Some(found) if !is_stale(&found) => Ok(found),
            Some(_) => Err(DuoSyncError::missing(format!(
                "{} still shows the previous content",
                selector
            ))),
            None => Err(DuoSyncError::missing(format!("{} did not appear", selector))),
        },
    }
}
