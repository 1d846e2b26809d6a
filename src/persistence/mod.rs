use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::DuoSyncError;

const APP_NAME: &str = "duosync";

pub const EXPORT_FILE: &str = "last_export.tsv";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json<T: Serialize>(data: &T, filename: &str) -> Result<PathBuf, DuoSyncError> {
    let file_path = get_data_file_path(filename);
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&file_path, json)?;
    log::info!("Data saved to: {}", file_path.display());
    Ok(file_path)
}

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(
    filename: &str,
) -> Result<T, DuoSyncError> {
    load_json_from(&get_data_file_path(filename))
}

fn load_json_from<T: for<'de> Deserialize<'de> + Default>(
    file_path: &Path,
) -> Result<T, DuoSyncError> {
    if !file_path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(file_path)?;
    let data: T = serde_json::from_str(&json)?;
    log::debug!("Data loaded from: {}", file_path.display());
    Ok(data)
}

pub fn load_json_or_default<T: for<'de> Deserialize<'de> + Default>(filename: &str) -> T {
    match load_json::<T>(filename) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Failed to load {}: {}. Using defaults.", filename, e);
            T::default()
        }
    }
}

/// Write the latest TSV export next to the config, so it outlives the prompt.
pub fn save_export(text: &str) -> Result<PathBuf, DuoSyncError> {
    save_text_in(&get_app_data_dir(), EXPORT_FILE, text)
}

fn save_text_in(dir: &Path, filename: &str, text: &str) -> Result<PathBuf, DuoSyncError> {
    fs::create_dir_all(dir)?;
    let file_path = dir.join(filename);
    let mut contents = text.to_string();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    fs::write(&file_path, contents)?;
    Ok(file_path)
}
