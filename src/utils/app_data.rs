use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "gitidx";

/// Get the application data directory for storing indexes
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Default output directory for the index called `name`
pub fn default_index_dir(name: &str) -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join("indexes").join(index_folder_name(name)))
}

/// Turn an index name into a single safe path component
pub fn index_folder_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match cleaned.trim_matches('.') {
        "" => "index".to_string(),
        trimmed => trimmed.to_string(),
    }
}
