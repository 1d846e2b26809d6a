use std::{
    collections::HashSet,
    time::Duration,
};

use reqwest::Client;
use serde::{
    de::DeserializeOwned,
    Serialize,
};
use serde_json::Value;

use crate::core::{
    DuoSyncError,
    SentencePair,
};

const API_VERSION: u32 = 6;
const NOTE_MODEL: &str = "Basic";
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct Request<'a> {
    action: &'a str,
    version: u32,
    params: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct NoteFields<'a> {
    front: &'a str,
    back: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewNote<'a> {
    deck_name: &'a str,
    model_name: &'a str,
    fields: NoteFields<'a>,
    tags: &'a [String],
}

pub(crate) fn build_notes<'a>(
    deck: &'a str,
    pairs: &'a [SentencePair],
    tags: &'a [String],
) -> Vec<NewNote<'a>> {
    pairs
        .iter()
        .map(|pair| NewNote {
            deck_name: deck,
            model_name: NOTE_MODEL,
            fields: NoteFields { front: &pair.question, back: &pair.answer },
            tags,
        })
        .collect()
}

/// Check the `{error, result}` envelope and hand back `result`.
pub fn parse_response(body: &str) -> Result<Value, DuoSyncError> {
    let response: Value = serde_json::from_str(body)
        .map_err(|e| DuoSyncError::Protocol(format!("response is not JSON: {}", e)))?;
    let Value::Object(mut fields) = response else {
        return Err(DuoSyncError::Protocol("response is not an object".to_string()));
    };

    if fields.len() != 2 {
        return Err(DuoSyncError::Protocol(
            "response has an unexpected number of fields".to_string(),
        ));
    }
    let Some(error) = fields.remove("error") else {
        return Err(DuoSyncError::Protocol("response is missing required error field".to_string()));
    };
    let Some(result) = fields.remove("result") else {
        return Err(DuoSyncError::Protocol(
            "response is missing required result field".to_string(),
        ));
    };

    match error {
        Value::Null => Ok(result),
        Value::String(message) => Err(DuoSyncError::Protocol(message)),
        other => Err(DuoSyncError::Protocol(other.to_string())),
    }
}

/// Count genuinely new note ids: nulls mark duplicates, and a sentence repeated
/// within one batch can come back with the same id twice.
pub fn count_added(ids: &[Option<u64>]) -> usize {
    ids.iter().flatten().collect::<HashSet<_>>().len()
}

/// AnkiConnect client.
#[derive(Debug, Clone)]
pub struct AnkiClient {
    client: Client,
    base_url: String,
}

impl AnkiClient {
    pub fn new(base_url: &str) -> Result<Self, DuoSyncError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DuoSyncError::Custom(format!("HTTP client build failed: {e}")))?;
        Ok(Self { client, base_url: base_url.to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Value,
    ) -> Result<T, DuoSyncError> {
        let request = Request { action, version: API_VERSION, params };
        let body = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DuoSyncError::ServiceUnreachable(e.to_string()))?
            .text()
            .await?;

        let result = parse_response(&body)?;
        serde_json::from_value(result).map_err(|e| {
            DuoSyncError::Protocol(format!("unexpected result for {}: {}", action, e))
        })
    }

    /// Plain GET against the base URL. Any failure means "not reachable".
    pub async fn is_reachable(&self) -> bool {
        match self.client.get(&self.base_url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::debug!("AnkiConnect probe failed: {}", e);
                false
            }
        }
    }

    pub async fn version(&self) -> Result<u32, DuoSyncError> {
        self.invoke("version", Value::Object(Default::default())).await
    }

    /// `createDeck` leaves an existing deck untouched, so this is idempotent.
    pub async fn ensure_deck(&self, name: &str) -> Result<(), DuoSyncError> {
        let deck_id: Option<u64> =
            self.invoke("createDeck", serde_json::json!({ "deck": name })).await?;
        log::debug!("Deck {:?} ready (id {:?})", name, deck_id);
        Ok(())
    }

    /// Returns one entry per pair: the new note id, or `None` for a duplicate.
    pub async fn add_notes(
        &self,
        deck: &str,
        pairs: &[SentencePair],
        tags: &[String],
    ) -> Result<Vec<Option<u64>>, DuoSyncError> {
        let notes = build_notes(deck, pairs, tags);
        self.invoke("addNotes", serde_json::json!({ "notes": notes })).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_accepts_envelope() {
        let result = parse_response(r#"{"result": [1, null, 2], "error": null}"#).unwrap();
        let ids: Vec<Option<u64>> = serde_json::from_value(result).unwrap();
        assert_eq!(ids, vec![Some(1), None, Some(2)]);
    }

    #[test]
    fn test_parse_response_rejects_bad_envelopes() {
        for body in [
            r#"{"result": 1}"#,
            r#"{"result": 1, "error": null, "extra": 0}"#,
            r#"{"result": 1, "other": null}"#,
            r#"{"error": null, "other": 1}"#,
            r#"{"result": null, "error": "deck was not found"}"#,
            r#"[1, 2]"#,
            "<html>not json</html>",
        ] {
            let parsed = parse_response(body);
            assert!(matches!(parsed, Err(DuoSyncError::Protocol(_))), "body: {}", body);
        }
    }

    #[test]
    fn test_parse_response_reports_service_error() {
        match parse_response(r#"{"result": null, "error": "collection is not available"}"#) {
            Err(DuoSyncError::Protocol(message)) => {
                assert_eq!(message, "collection is not available")
            }
            other => panic!("Expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_count_added_drops_nulls_and_repeats() {
        assert_eq!(count_added(&[Some(10), None, Some(11), Some(10)]), 2);
        assert_eq!(count_added(&[None, None]), 0);
        assert_eq!(count_added(&[]), 0);
    }

    #[test]
    fn test_note_shape() {
        let pairs = vec![SentencePair::new("We eat", "Noi mangiamo")];
        let tags = vec!["duolingo".to_string()];
        let notes = build_notes("Duolingo Sentences", &pairs, &tags);
        let json = serde_json::to_value(&notes).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "deckName": "Duolingo Sentences",
                "modelName": "Basic",
                "fields": { "Front": "We eat", "Back": "Noi mangiamo" },
                "tags": ["duolingo"],
            }])
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_probe_is_false() {
        // Nothing listens on port 9 (discard) on a test machine.
        let client = AnkiClient::new("http://127.0.0.1:9").unwrap();
        assert!(!client.is_reachable().await);
    }
}
