// Preset persistence - last settings, named presets and setlists

pub mod storage;
pub mod types;

pub use storage::{JsonFileStore, PresetStore, StorageError};
pub use types::{MetronomeSettings, Preset, Setlist};

/// Generate a new unique preset / setlist id
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
