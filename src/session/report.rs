use crate::{
    anki::FlashcardService,
    core::{
        DuoSyncError,
        SentencePair,
        SyncResult,
    },
    export::{
        dedup_pairs,
        result_message,
        to_tsv,
    },
};

/// Outcome of one sync/export step.
#[derive(Debug)]
pub struct CycleReport {
    pub result: SyncResult,
    /// Set when the service was reachable but the sync itself failed.
    pub sync_error: Option<DuoSyncError>,
}

impl CycleReport {
    pub fn message(&self) -> String {
        let message = result_message(self.result.added_count, &self.result.export_text);
        match &self.sync_error {
            Some(e) => format!("Sync to Anki failed: {}\n\n{}", e, message),
            None => message,
        }
    }
}

/// Deduplicate, then sync when the service answers the probe. The export
/// text is produced whatever happens to the sync.
pub async fn sync_and_export(
    service: &dyn FlashcardService,
    collection: &str,
    pairs: &[SentencePair],
    tags: &[String],
) -> CycleReport {
    let unique = dedup_pairs(pairs);
    let export_text = to_tsv(&unique);

    if unique.is_empty() {
        return CycleReport { result: SyncResult { added_count: None, export_text }, sync_error: None };
    }

    if !service.is_reachable().await {
        log::info!("Flashcard service not reachable; showing the export only");
        return CycleReport { result: SyncResult { added_count: None, export_text }, sync_error: None };
    }

    let synced = async {
        service.ensure_collection(collection).await?;
        service.submit_pairs(collection, &unique, tags).await
    }
    .await;

    match synced {
        Ok(added) => CycleReport {
            result: SyncResult { added_count: Some(added), export_text },
            sync_error: None,
        },
        Err(e) => {
            log::warn!("Sync failed: {}", e);
            CycleReport { result: SyncResult { added_count: None, export_text }, sync_error: Some(e) }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Mutex,
    };

    use async_trait::async_trait;

    use super::*;

    /// In-memory stand-in for AnkiConnect: a note equal to an existing one is a duplicate.
    #[derive(Default)]
    pub(crate) struct FakeService {
        pub unreachable: bool,
        pub broken: bool,
        pub notes: Mutex<Vec<(String, SentencePair)>>,
        pub submissions: AtomicUsize,
    }

    #[async_trait]
    impl FlashcardService for FakeService {
        async fn is_reachable(&self) -> bool {
            !self.unreachable
        }

        async fn ensure_collection(&self, _name: &str) -> Result<(), DuoSyncError> {
            Ok(())
        }

        async fn submit_pairs(
            &self,
            collection: &str,
            pairs: &[SentencePair],
            _tags: &[String],
        ) -> Result<usize, DuoSyncError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(DuoSyncError::Protocol(
                    "response has an unexpected number of fields".to_string(),
                ));
            }

            let mut notes = self.notes.lock().unwrap();
            let mut ids = Vec::new();
            for pair in pairs {
                let note = (collection.to_string(), pair.clone());
                if notes.contains(&note) {
                    ids.push(None);
                } else {
                    notes.push(note);
                    ids.push(Some(notes.len() as u64));
                }
            }
            Ok(crate::anki::api::count_added(&ids))
        }
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<SentencePair> {
        items.iter().map(|&item| item.into()).collect()
    }

    fn tags() -> Vec<String> {
        vec!["duolingo".to_string()]
    }

    #[tokio::test]
    async fn test_duplicate_cards_export_two_lines() {
        let service = FakeService::default();
        let input = pairs(&[
            ("Noi mangiamo", "We eat"),
            ("Noi mangiamo", "We eat"),
            ("Tu bevi", "You drink"),
        ]);

        let report = sync_and_export(&service, "Deck", &input, &tags()).await;

        assert_eq!(report.result.export_text, "Noi mangiamo\tWe eat\nTu bevi\tYou drink");
        assert_eq!(report.result.added_count, Some(2));
        assert!(report.message().starts_with("2 sentences were synced to Anki"));
    }

    #[tokio::test]
    async fn test_resubmission_adds_nothing() {
        let service = FakeService::default();
        let input = pairs(&[("Noi mangiamo", "We eat"), ("Tu bevi", "You drink")]);

        let first = sync_and_export(&service, "Deck", &input, &tags()).await;
        let second = sync_and_export(&service, "Deck", &input, &tags()).await;

        assert_eq!(first.result.added_count, Some(2));
        assert_eq!(second.result.added_count, Some(0));
        assert_eq!(first.result.export_text, second.result.export_text);
    }

    #[tokio::test]
    async fn test_service_down_skips_sync_and_still_exports() {
        let service = FakeService { unreachable: true, ..FakeService::default() };
        let input = pairs(&[("a", "1"), ("b", "2"), ("c", "3")]);

        let report = sync_and_export(&service, "Deck", &input, &tags()).await;

        assert_eq!(service.submissions.load(Ordering::SeqCst), 0);
        assert_eq!(report.result.added_count, None);
        assert_eq!(report.result.export_text, "a\t1\nb\t2\nc\t3");
        assert!(report.sync_error.is_none());
    }

    #[tokio::test]
    async fn test_protocol_violation_keeps_export() {
        let service = FakeService { broken: true, ..FakeService::default() };
        let input = pairs(&[("a", "1")]);

        let report = sync_and_export(&service, "Deck", &input, &tags()).await;

        assert!(matches!(report.sync_error, Some(DuoSyncError::Protocol(_))));
        assert_eq!(report.result.export_text, "a\t1");
        assert!(report.message().starts_with("Sync to Anki failed"));
    }

    #[tokio::test]
    async fn test_nothing_extracted_skips_sync() {
        let service = FakeService::default();
        let report = sync_and_export(&service, "Deck", &[], &tags()).await;
        assert_eq!(service.submissions.load(Ordering::SeqCst), 0);
        assert_eq!(report.result.export_text, "");
    }
}
