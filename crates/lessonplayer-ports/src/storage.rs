use crate::types::*;
use serde::{Deserialize, Serialize};

fn default_use_pitch_decoupled_backend() -> bool {
    true
}

fn default_volume() -> Volume100 {
    Volume100::default()
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDto {
    #[serde(default = "default_use_pitch_decoupled_backend")]
    pub use_pitch_decoupled_backend: bool,
    pub low_speed_eq_enabled: bool,
    pub count_in_enabled: bool,
    #[serde(default = "default_volume")]
    pub volume: Volume100,
}

impl Default for SettingsDto {
    fn default() -> Self {
        Self {
            use_pitch_decoupled_backend: true,
            low_speed_eq_enabled: false,
            count_in_enabled: false,
            volume: Volume100::default(),
        }
    }
}

/// Lesson metadata as kept by the library. `tags` is the raw comma-separated text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonMetadata {
    pub title: Option<String>,
    pub tempo: Option<u32>,
    pub tags: Option<String>,
}

impl LessonMetadata {
    pub fn first_tag(&self) -> Option<String> {
        let tags = self.tags.as_deref()?;
        let first = tags.split(',').next()?.trim();
        if first.is_empty() {
            None
        } else {
            Some(first.to_string())
        }
    }
}

/// Partial metadata update; `None` leaves the stored field as is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub tempo: Option<u32>,
    pub tags: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticePreset {
    pub tempo: Option<u32>,
    pub transpose_steps: Option<i32>,
    pub loop_start_ms: Option<PositionMs>,
    pub loop_end_ms: Option<PositionMs>,
    pub groove: Option<String>,
}

pub trait StoragePort: Send + Sync {
    fn load_settings(&self) -> Result<SettingsDto, StorageError>;
    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError>;
}

pub trait MetadataStorePort: Send + Sync {
    fn get_metadata(&self, item: &ItemKey) -> Result<Option<LessonMetadata>, StorageError>;
    fn update_metadata(&self, item: &ItemKey, update: MetadataUpdate) -> Result<(), StorageError>;

    fn get_preset(&self, item: &ItemKey) -> Result<Option<PracticePreset>, StorageError>;
    /// Creates or overwrites the single preset row for `item`.
    fn save_preset(&self, item: &ItemKey, preset: &PracticePreset) -> Result<(), StorageError>;
    /// Deleting a missing row is not an error.
    fn delete_preset(&self, item: &ItemKey) -> Result<(), StorageError>;
}
