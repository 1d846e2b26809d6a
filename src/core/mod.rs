pub mod config;
pub mod errors;
pub mod models;
pub mod text;

pub use config::Config;
pub use errors::DuoSyncError;
pub use models::{
    ExerciseState,
    SentencePair,
    SyncResult,
};
