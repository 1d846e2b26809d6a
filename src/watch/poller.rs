use std::{
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Arc,
    },
    time::Duration,
};

use tokio::task::JoinHandle;

use crate::page::{
    Element,
    Page,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempts {
    /// At most this many evaluations (zero still evaluates once).
    Bounded(u32),
    Unbounded,
}

impl Attempts {
    /// Spend one attempt; false once none are left.
    fn consume(&mut self) -> bool {
        match self {
            Attempts::Bounded(n) => {
                *n = n.saturating_sub(1);
                *n > 0
            }
            Attempts::Unbounded => true,
        }
    }
}

/// Predicate over the observable page state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The first element matching `selector` exists and, when `text` is set,
    /// its lower-cased text equals it.
    Present { selector: String, text: Option<String> },
    /// Nothing matches `selector`.
    Absent { selector: String },
}

impl Condition {
    pub fn present(selector: &str) -> Self {
        Condition::Present { selector: selector.to_string(), text: None }
    }

    pub fn with_text(selector: &str, text: &str) -> Self {
        Condition::Present { selector: selector.to_string(), text: Some(text.to_string()) }
    }

    pub fn absent(selector: &str) -> Self {
        Condition::Absent { selector: selector.to_string() }
    }

    /// `Some` when satisfied, carrying the matched element for `Present`.
    pub fn evaluate<P: Page + ?Sized>(&self, page: &P) -> Option<Option<Element>> {
        match self {
            Condition::Present { selector, text } => {
                page.query_with_text(selector, text.as_deref()).map(Some)
            }
            Condition::Absent { selector } => match page.query(selector) {
                Some(_) => None,
                None => Some(None),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatchTarget<K> {
    pub key: K,
    pub condition: Condition,
}

impl<K> WatchTarget<K> {
    pub fn new(key: K, condition: Condition) -> Self {
        Self { key, condition }
    }
}

#[derive(Debug, Clone)]
pub struct Hit<K> {
    pub key: K,
    pub element: Option<Element>,
}

/// Evaluate every target once per tick, in order, until one holds or the
/// attempts run out. Exhaustion is not an error: the awaited state simply
/// did not occur.
pub async fn poll_any<P, K>(
    page: &P,
    targets: &[WatchTarget<K>],
    interval: Duration,
    attempts: Attempts,
) -> Option<Hit<K>>
where
    P: Page + ?Sized,
    K: Clone,
{
    poll_loop(page, targets, interval, attempts, None).await
}

pub async fn poll_until<P: Page + ?Sized>(
    page: &P,
    condition: Condition,
    interval: Duration,
    attempts: Attempts,
) -> Option<Hit<()>> {
    poll_any(page, &[WatchTarget::new((), condition)], interval, attempts).await
}

async fn poll_loop<P, K>(
    page: &P,
    targets: &[WatchTarget<K>],
    interval: Duration,
    mut attempts: Attempts,
    cancel_token: Option<&AtomicBool>,
) -> Option<Hit<K>>
where
    P: Page + ?Sized,
    K: Clone,
{
    loop {
        if cancel_token.is_some_and(|token| token.load(Ordering::Relaxed)) {
            log::debug!("Watch cancelled");
            return None;
        }

        for target in targets {
            if let Some(element) = target.condition.evaluate(page) {
                return Some(Hit { key: target.key.clone(), element });
            }
        }

        if !attempts.consume() {
            let conditions: Vec<&Condition> = targets.iter().map(|t| &t.condition).collect();
            log::debug!("Watch gave up on {:?}", conditions);
            return None;
        }

        tokio::time::sleep(interval).await;
    }
}

/// One outstanding [`poll_any`] running as its own task.
///
/// The task stops at its next tick once cancelled; dropping the handle
/// cancels it.
pub struct WatchHandle<K> {
    cancel_token: Arc<AtomicBool>,
    join_handle: JoinHandle<Option<Hit<K>>>,
}

impl<K> WatchHandle<K>
where
    K: Clone + Send + Sync + 'static,
{
    pub fn arm<P>(
        page: Arc<P>,
        targets: Vec<WatchTarget<K>>,
        interval: Duration,
        attempts: Attempts,
    ) -> Self
    where
        P: Page + ?Sized + 'static,
    {
        let cancel_token = Arc::new(AtomicBool::new(false));
        let token = cancel_token.clone();

        let join_handle = tokio::spawn(async move {
            poll_loop(page.as_ref(), &targets, interval, attempts, Some(&token)).await
        });

        Self { cancel_token, join_handle }
    }

    /// The matched target, or `None` once the attempts ran out or the watch
    /// was cancelled. Resolves at most once per handle.
    pub async fn outcome(&mut self) -> Option<Hit<K>> {
        match (&mut self.join_handle).await {
            Ok(hit) => hit,
            Err(e) => {
                log::warn!("Watch task failed: {}", e);
                None
            }
        }
    }
}

impl<K> WatchHandle<K> {
    pub fn cancel(&self) {
        self.cancel_token.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

impl<K> Drop for WatchHandle<K> {
    fn drop(&mut self) {
        self.cancel();
    }
}
