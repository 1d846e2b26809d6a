pub mod element;
pub mod selectors;
pub mod snapshot;

pub use element::{
    Element,
    ElementPath,
    PathStep,
};
pub use snapshot::SnapshotPage;
use tokio::sync::watch;

use crate::core::DuoSyncError;

/// Read access to the host page plus simulated clicks.
///
/// Reads are synchronous, like DOM reads in the browser. Waiting happens
/// through [`Page::changes`], which ticks with the structure revision.
pub trait Page: Send + Sync {
    fn query_all(&self, selector: &str) -> Vec<Element>;

    fn query_within(&self, scope: &Element, selector: &str) -> Vec<Element>;

    fn click(&self, element: &Element) -> Result<(), DuoSyncError>;

    fn revision(&self) -> u64;

    fn changes(&self) -> watch::Receiver<u64>;

    fn query(&self, selector: &str) -> Option<Element> {
        self.query_all(selector).into_iter().next()
    }

    fn query_first_within(&self, scope: &Element, selector: &str) -> Option<Element> {
        self.query_within(scope, selector).into_iter().next()
    }

    /// Query inside `scope` when given, otherwise the whole document.
    fn find(&self, scope: Option<&Element>, selector: &str) -> Vec<Element> {
        match scope {
            Some(scope) => self.query_within(scope, selector),
            None => self.query_all(selector),
        }
    }

    /// First element matching `selector`, kept only if its text equals `has_text`
    /// (case-insensitive). Later matches are not considered.
    fn query_with_text(&self, selector: &str, has_text: Option<&str>) -> Option<Element> {
        let element = self.query(selector)?;
        match has_text {
            Some(text) if !text.is_empty() && element.normalized_text() != text.to_lowercase() => {
                None
            }
            _ => Some(element),
        }
    }
}
