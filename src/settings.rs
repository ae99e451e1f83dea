use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;

use crate::game_logic::{lookup, Archetype, SettingsError, VehicleProfile, DEFAULT_GAME_MODE};

pub const SETTINGS_PATH: &str = "racer_settings.json";

pub const SELECTED_CAR_KEY: &str = "selectedCar";
pub const GAME_MODE_KEY: &str = "selectedGameMode";
pub const HIGH_SCORE_KEY: &str = "highScore";

/// String key/value persistence.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// A flat JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens `path`. A missing or unreadable file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read(&path) {
            Ok(values) => values,
            Err(SettingsError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                BTreeMap::new()
            }
            Err(err) => {
                warn!("Ignoring settings in {}: {err}", path.display());
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    fn read(path: &Path) -> Result<BTreeMap<String, String>, SettingsError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Player settings backed by some [`SettingsStore`].
#[derive(Resource)]
pub struct Settings {
    store: Box<dyn SettingsStore>,
}

impl Settings {
    pub fn new(store: impl SettingsStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Profile of the saved car. Unknown or missing ids fall back to the sports car.
    pub fn selected_car(&self) -> VehicleProfile {
        lookup(&self.store.get(SELECTED_CAR_KEY).unwrap_or_default())
    }

    pub fn set_selected_car(&mut self, archetype: Archetype) {
        self.write(SELECTED_CAR_KEY, archetype.as_str());
    }

    pub fn game_mode(&self) -> String {
        self.store
            .get(GAME_MODE_KEY)
            .filter(|mode| !mode.is_empty())
            .unwrap_or_else(|| DEFAULT_GAME_MODE.to_string())
    }

    pub fn high_score(&self) -> f64 {
        self.store
            .get(HIGH_SCORE_KEY)
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|score| score.is_finite())
            .unwrap_or(0.0)
    }

    /// Stores `score` when it beats the saved high score. Returns true if it did.
    pub fn record_score(&mut self, score: f64) -> bool {
        if score <= self.high_score() {
            return false;
        }
        self.write(HIGH_SCORE_KEY, &format!("{}", score.floor()));
        true
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value) {
            warn!("Could not save {key}: {err}");
        }
    }
}
