//! Settings persistence.
//!
//! Every setter writes through immediately so a cold start renders the last
//! negotiated state before any peer is reachable.

use crate::error::StorageError;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;
use watchface_core::{SettingKey, Settings};

const CHANGE_CAPACITY: usize = 32;

/// Typed settings with a change stream.
pub trait Storage: Send + Sync {
    /// Snapshot of every setting.
    fn settings(&self) -> Settings;

    fn get(&self, key: SettingKey) -> bool {
        self.settings().get(key)
    }

    /// Persist `value`. Subscribers are notified only when it changed.
    fn set(&self, key: SettingKey, value: bool) -> Result<(), StorageError>;

    fn subscribe(&self) -> broadcast::Receiver<SettingKey>;
}

/// [`Storage`] kept in memory, optionally mirrored to a JSON file.
#[derive(Debug)]
pub struct SettingsStore {
    settings: RwLock<Settings>,
    path: Option<PathBuf>,
    changes: broadcast::Sender<SettingKey>,
}

impl SettingsStore {
    pub fn in_memory(settings: Settings) -> Self {
        Self::with_path(settings, None)
    }

    /// Load `path`, or start from defaults if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let settings = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(err) => return Err(err.into()),
        };
        tracing::info!(path = %path.display(), "settings loaded");
        Ok(Self::with_path(settings, Some(path)))
    }

    fn with_path(settings: Settings, path: Option<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            settings: RwLock::new(settings),
            path,
            changes,
        }
    }

    fn persist(&self, settings: &Settings) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(settings)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl Storage for SettingsStore {
    fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, key: SettingKey, value: bool) -> Result<(), StorageError> {
        let snapshot = {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            if !settings.set(key, value) {
                return Ok(());
            }
            settings.clone()
        };
        self.persist(&snapshot)?;
        tracing::debug!(%key, value, "setting changed");
        let _ = self.changes.send(key);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingKey> {
        self.changes.subscribe()
    }
}
