use async_trait::async_trait;

pub mod api;

pub use api::AnkiClient;

use crate::core::{
    DuoSyncError,
    SentencePair,
};

/// The narrow slice of the flashcard service the session needs.
#[async_trait]
pub trait FlashcardService: Send + Sync {
    /// Cheap reachability probe; failure only means "skip the sync step".
    async fn is_reachable(&self) -> bool;

    /// Create the named collection if it does not exist yet.
    async fn ensure_collection(&self, name: &str) -> Result<(), DuoSyncError>;

    /// Add every pair to `collection` and return how many notes were new.
    async fn submit_pairs(
        &self,
        collection: &str,
        pairs: &[SentencePair],
        tags: &[String],
    ) -> Result<usize, DuoSyncError>;
}

#[async_trait]
impl FlashcardService for AnkiClient {
    async fn is_reachable(&self) -> bool {
        AnkiClient::is_reachable(self).await
    }

    async fn ensure_collection(&self, name: &str) -> Result<(), DuoSyncError> {
        self.ensure_deck(name).await
    }

    async fn submit_pairs(
        &self,
        collection: &str,
        pairs: &[SentencePair],
        tags: &[String],
    ) -> Result<usize, DuoSyncError> {
        let ids = self.add_notes(collection, pairs, tags).await?;
        let added = api::count_added(&ids);
        log::info!("AnkiConnect accepted {} of {} notes", added, pairs.len());
        Ok(added)
    }
}

/// Retry the reachability probe a few times, e.g. while Anki is starting.
pub async fn wait_awake(
    service: &dyn FlashcardService,
    wait_time: std::time::Duration,
    max_attempts: u32,
) -> bool {
    for attempt in 1..=max_attempts {
        if service.is_reachable().await {
            log::info!("AnkiConnect is online");
            return true;
        }
        log::info!(
            "AnkiConnect attempt {} of {} failed. Retrying in {:?}...",
            attempt,
            max_attempts,
            wait_time
        );
        if attempt < max_attempts {
            tokio::time::sleep(wait_time).await;
        }
    }
    false
}
