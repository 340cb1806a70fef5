use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::AppSettings;

pub const SETTINGS_FILE: &str = "credprint-settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings could not be serialized: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Application preferences, optionally persisted as one JSON document.
pub struct SettingsStore {
    path: Option<PathBuf>,
    current: RwLock<AppSettings>,
}

impl SettingsStore {
    /// Settings that live only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: RwLock::new(AppSettings::default()),
        }
    }

    /// Reads `credprint-settings.json` from `dir`. A missing file starts from
    /// the defaults, as does an unreadable document.
    pub async fn load(dir: &Path) -> Result<Self, SettingsError> {
        let path = dir.join(SETTINGS_FILE);
        let settings = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<AppSettings>(&bytes) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
                    AppSettings::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => AppSettings::default(),
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), "settings loaded");
        Ok(Self {
            path: Some(path),
            current: RwLock::new(settings),
        })
    }

    pub async fn get(&self) -> AppSettings {
        self.current.read().await.clone()
    }

    pub async fn save(&self, settings: AppSettings) -> Result<AppSettings, SettingsError> {
        let mut current = self.current.write().await;
        if let Some(path) = &self.path {
            write_document(path, &settings).await?;
        }
        *current = settings.clone();
        info!("settings saved");
        Ok(settings)
    }

    pub async fn reset(&self) -> Result<AppSettings, SettingsError> {
        self.save(AppSettings::default()).await
    }
}

/// Writes next to the target and renames, so readers never see half a file.
async fn write_document(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let body = serde_json::to_vec_pretty(settings)?;
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, body).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}
