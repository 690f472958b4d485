// Preset storage - JSON files in the application data directory

use super::types::{MetronomeSettings, Preset, Setlist};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("No data directory available on this platform")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence of settings, presets and setlists
///
/// Saving a preset or setlist whose id already exists replaces it in place.
pub trait PresetStore {
    fn save_settings(&self, settings: &MetronomeSettings) -> Result<(), StorageError>;
    fn load_settings(&self) -> Result<Option<MetronomeSettings>, StorageError>;

    fn save_preset(&self, preset: &Preset) -> Result<(), StorageError>;
    fn presets(&self) -> Result<Vec<Preset>, StorageError>;
    /// Returns false if no preset had this id
    fn delete_preset(&self, id: &str) -> Result<bool, StorageError>;

    fn save_setlist(&self, setlist: &Setlist) -> Result<(), StorageError>;
    fn setlists(&self) -> Result<Vec<Setlist>, StorageError>;
    fn delete_setlist(&self, id: &str) -> Result<bool, StorageError>;

    /// First preset with this name (case-insensitive)
    fn find_preset(&self, name: &str) -> Result<Option<Preset>, StorageError> {
        Ok(self
            .presets()?
            .into_iter()
            .find(|preset| preset.name.eq_ignore_ascii_case(name)))
    }
}

/// `PresetStore` backed by three JSON files in one directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub const SETTINGS_FILE: &'static str = "settings.json";
    pub const PRESETS_FILE: &'static str = "presets.json";
    pub const SETLISTS_FILE: &'static str = "setlists.json";

    /// Store rooted at `dir` (created on first write)
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store in <data dir>/mymusic_metronome
    pub fn open_default() -> Result<Self, StorageError> {
        dirs::data_dir()
            .map(|dir| Self::new(dir.join(crate::APP_DIR_NAME)))
            .ok_or(StorageError::NoDataDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StorageError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Write through a temporary file so a crash never leaves a truncated file
    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(value)?)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn read_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StorageError> {
        Ok(self.read(file)?.unwrap_or_default())
    }
}

fn upsert<T, F>(items: &mut Vec<T>, item: T, same_id: F)
where
    F: Fn(&T) -> bool,
{
    match items.iter_mut().find(|existing| same_id(existing)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl PresetStore for JsonFileStore {
    fn save_settings(&self, settings: &MetronomeSettings) -> Result<(), StorageError> {
        self.write(Self::SETTINGS_FILE, settings)
    }

    fn load_settings(&self) -> Result<Option<MetronomeSettings>, StorageError> {
        self.read(Self::SETTINGS_FILE)
    }

    fn save_preset(&self, preset: &Preset) -> Result<(), StorageError> {
        let mut presets: Vec<Preset> = self.read_list(Self::PRESETS_FILE)?;
        upsert(&mut presets, preset.clone(), |p| p.id == preset.id);
        self.write(Self::PRESETS_FILE, &presets)
    }

    fn presets(&self) -> Result<Vec<Preset>, StorageError> {
        self.read_list(Self::PRESETS_FILE)
    }

    fn delete_preset(&self, id: &str) -> Result<bool, StorageError> {
        let mut presets: Vec<Preset> = self.read_list(Self::PRESETS_FILE)?;
        let before = presets.len();
        presets.retain(|p| p.id != id);
        if presets.len() == before {
            return Ok(false);
        }
        self.write(Self::PRESETS_FILE, &presets)?;
        Ok(true)
    }

    fn save_setlist(&self, setlist: &Setlist) -> Result<(), StorageError> {
        let mut setlists: Vec<Setlist> = self.read_list(Self::SETLISTS_FILE)?;
        upsert(&mut setlists, setlist.clone(), |s| s.id == setlist.id);
        self.write(Self::SETLISTS_FILE, &setlists)
    }

    fn setlists(&self) -> Result<Vec<Setlist>, StorageError> {
        self.read_list(Self::SETLISTS_FILE)
    }

    fn delete_setlist(&self, id: &str) -> Result<bool, StorageError> {
        let mut setlists: Vec<Setlist> = self.read_list(Self::SETLISTS_FILE)?;
        let before = setlists.len();
        setlists.retain(|s| s.id != id);
        if setlists.len() == before {
            return Ok(false);
        }
        self.write(Self::SETLISTS_FILE, &setlists)?;
        Ok(true)
    }
}
