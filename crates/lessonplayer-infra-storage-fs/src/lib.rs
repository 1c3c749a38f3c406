use lessonplayer_ports::storage::{
    LessonMetadata, MetadataStorePort, MetadataUpdate, PracticePreset, SettingsDto, StorageError,
    StoragePort,
};
use lessonplayer_ports::types::ItemKey;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

type LibraryFile = BTreeMap<String, LessonMetadata>;
type PresetFile = BTreeMap<String, PracticePreset>;

/// JSON-file storage: `settings.json`, `library.json` (lesson metadata keyed
/// by file path) and `presets.json` (one practice preset per file path).
pub struct FsStorage {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FsStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            write_lock: Mutex::new(()),
        }
    }

    pub fn default_base_dir() -> Result<PathBuf, StorageError> {
        let base = dirs_next::config_dir()
            .ok_or_else(|| StorageError::Io("config dir not found".to_string()))?;
        Ok(base.join("LessonPlayer"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Adds or replaces a library entry, as the folder scanner does.
    pub fn insert_lesson(
        &self,
        item: &ItemKey,
        metadata: LessonMetadata,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let path = self.library_path();
        let mut library: LibraryFile = Self::read_json_or_default(&path)?;
        library.insert(item.0.clone(), metadata);
        Self::write_json(&path, &library)
    }

    fn settings_path(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    fn library_path(&self) -> PathBuf {
        self.base_dir.join("library.json")
    }

    fn presets_path(&self) -> PathBuf {
        self.base_dir.join("presets.json")
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
        let data = fs::read(path).map_err(|e| StorageError::Io(e.to_string()))?;
        serde_json::from_slice(&data).map_err(|e| StorageError::Serde(e.to_string()))
    }

    fn read_json_or_default<T>(path: &Path) -> Result<T, StorageError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if !path.exists() {
            return Ok(T::default());
        }
        Self::read_json(path)
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let data =
            serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serde(e.to_string()))?;
        fs::write(path, data).map_err(|e| StorageError::Io(e.to_string()))
    }
}

impl Default for FsStorage {
    fn default() -> Self {
        let base_dir = Self::default_base_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(base_dir)
    }
}

impl StoragePort for FsStorage {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(SettingsDto::default());
        }
        Self::read_json(&path)
    }

    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        Self::write_json(&self.settings_path(), s)
    }
}

impl MetadataStorePort for FsStorage {
    fn get_metadata(&self, item: &ItemKey) -> Result<Option<LessonMetadata>, StorageError> {
        let library: LibraryFile = Self::read_json_or_default(&self.library_path())?;
        Ok(library.get(item.as_str()).cloned())
    }

    fn update_metadata(&self, item: &ItemKey, update: MetadataUpdate) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let path = self.library_path();
        let mut library: LibraryFile = Self::read_json_or_default(&path)?;
        let entry = library.entry(item.0.clone()).or_default();

        if let Some(title) = update.title {
            entry.title = Some(title);
        }
        if let Some(tempo) = update.tempo {
            entry.tempo = Some(tempo);
        }
        if let Some(tags) = update.tags {
            entry.tags = Some(tags);
        }
        debug!(item = %item, "lesson metadata updated");
        Self::write_json(&path, &library)
    }

    fn get_preset(&self, item: &ItemKey) -> Result<Option<PracticePreset>, StorageError> {
        let presets: PresetFile = Self::read_json_or_default(&self.presets_path())?;
        Ok(presets.get(item.as_str()).cloned())
    }

    fn save_preset(&self, item: &ItemKey, preset: &PracticePreset) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let path = self.presets_path();
        let mut presets: PresetFile = Self::read_json_or_default(&path)?;
        presets.insert(item.0.clone(), preset.clone());
        Self::write_json(&path, &presets)
    }

    fn delete_preset(&self, item: &ItemKey) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let path = self.presets_path();
        let mut presets: PresetFile = Self::read_json_or_default(&path)?;
        if presets.remove(item.as_str()).is_none() {
            return Ok(());
        }
        Self::write_json(&path, &presets)
    }
}
