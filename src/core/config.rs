use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    persistence::load_json_or_default,
    watch::Attempts,
};

pub const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_DECK: &str = "Duolingo Sentences";
pub const DEFAULT_ANKI_URL: &str = "http://127.0.0.1:8765";
pub const DEFAULT_BRIDGE_ADDR: &str = "127.0.0.1:8767";

/// Immutable settings handed to the session driver at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub deck_name: String,
    /// Arm the watchers at startup; otherwise only the manual trigger runs.
    pub auto_run: bool,
    pub notify_on_result: bool,
    pub verbose_logging: bool,
    /// Ask before advancing the host application after a sync.
    pub confirm_continue: bool,
    /// Also write every export to `last_export.tsv` in the data directory.
    pub export_to_file: bool,
    pub anki_url: String,
    pub bridge_addr: String,
    pub poll_interval_ms: u64,
    /// `None` watches forever.
    pub watch_attempts: Option<u32>,
    pub click_attempts: u32,
    pub answer_timeout_ms: u64,
    pub confirm_timeout_ms: u64,
    pub tags: Vec<String>,
    pub story_tags: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deck_name: DEFAULT_DECK.to_string(),
            auto_run: true,
            notify_on_result: true,
            verbose_logging: false,
            confirm_continue: true,
            export_to_file: true,
            anki_url: DEFAULT_ANKI_URL.to_string(),
            bridge_addr: DEFAULT_BRIDGE_ADDR.to_string(),
            poll_interval_ms: 300,
            watch_attempts: None,
            click_attempts: 10,
            answer_timeout_ms: 10_000,
            confirm_timeout_ms: 120_000,
            tags: vec!["duolingo".to_string()],
            story_tags: vec!["duolingo".to_string(), "translate_me".to_string()],
        }
    }
}

impl Config {
    pub fn load() -> Self {
        load_json_or_default::<Config>(CONFIG_FILE)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn answer_timeout(&self) -> Duration {
        Duration::from_millis(self.answer_timeout_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn watch_attempts(&self) -> Attempts {
        match self.watch_attempts {
            Some(n) => Attempts::Bounded(n),
            None => Attempts::Unbounded,
        }
    }

    pub fn click_attempts(&self) -> Attempts {
        Attempts::Bounded(self.click_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "deck_name": "Italiano", "auto_run": false }"#).unwrap();
        assert_eq!(config.deck_name, "Italiano");
        assert!(!config.auto_run);
        assert!(config.notify_on_result);
        assert_eq!(config.poll_interval(), Duration::from_millis(300));
        assert_eq!(config.watch_attempts(), Attempts::Unbounded);
        assert_eq!(config.tags, vec!["duolingo".to_string()]);
    }

    #[test]
    fn test_bounded_watch_attempts() {
        let config = Config { watch_attempts: Some(4), ..Config::default() };
        assert_eq!(config.watch_attempts(), Attempts::Bounded(4));
        assert_eq!(config.click_attempts(), Attempts::Bounded(10));
    }
}
