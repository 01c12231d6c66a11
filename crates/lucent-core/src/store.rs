//! JSON persistence for presets, manual groups and layouts.
//!
//! Reads fall back to empty collections and writes are logged and
//! swallowed; a broken file never stops the daemon.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::config::{config_dir, load_or_default};
use crate::grouping::ManualGroupData;
use crate::layout::WindowLayout;
use crate::preset::WindowPreset;
use crate::Result;

/// Contents of `presets.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetData {
    pub presets: Vec<WindowPreset>,
    pub manual_groups: Vec<ManualGroupData>,
}

/// Contents of `layouts.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutData {
    pub layouts: Vec<WindowLayout>,
}

/// Location of the JSON files. Defaults to the config directory.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: Option<PathBuf>,
}

impl Default for DataDir {
    fn default() -> Self {
        Self { root: config_dir() }
    }
}

impl DataDir {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn presets_path(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|r| r.join("presets.json"))
    }

    pub fn layouts_path(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|r| r.join("layouts.json"))
    }

    pub fn load_presets(&self) -> PresetData {
        load_or_default(|| read_json(self.presets_path()), PresetData::default)
    }

    pub fn load_layouts(&self) -> LayoutData {
        load_or_default(|| read_json(self.layouts_path()), LayoutData::default)
    }

    pub fn save_presets(&self, data: &PresetData) {
        if let Err(e) = write_json(self.presets_path(), data) {
            log::error!("Failed to save presets: {e}");
        }
    }

    pub fn save_layouts(&self, data: &LayoutData) {
        if let Err(e) = write_json(self.layouts_path(), data) {
            log::error!("Failed to save layouts: {e}");
        }
    }
}

fn missing(path: Option<PathBuf>) -> Result<PathBuf> {
    path.ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "could not determine data path").into()
    })
}

fn read_json<T: DeserializeOwned>(path: Option<PathBuf>) -> Result<T> {
    let path = missing(path)?;
    let content = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_json<T: Serialize>(path: Option<PathBuf>, value: &T) -> Result<()> {
    let path = missing(path)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    write_atomic(&path, &serde_json::to_string_pretty(value)?)
}

/// Writes through a temporary file so a crash never leaves half a file.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetStore;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lucent-store-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_files_yield_empty_collections() {
        // Arrange
        let dir = DataDir::at(temp_dir("missing"));

        // Act
        let presets = dir.load_presets();
        let layouts = dir.load_layouts();

        // Assert
        assert!(presets.presets.is_empty());
        assert!(layouts.layouts.is_empty());
    }

    #[test]
    fn presets_and_manual_groups_persist() {
        // Arrange
        let root = temp_dir("presets");
        let dir = DataDir::at(&root);
        let mut store = PresetStore::default();
        store.create("Focus");
        let data = PresetData {
            presets: store.presets().to_vec(),
            manual_groups: vec![ManualGroupData {
                id: "g1".into(),
                name: "Editors".into(),
                process_names: vec!["Code".into()],
            }],
        };

        // Act
        dir.save_presets(&data);
        let loaded = dir.load_presets();

        // Assert
        assert_eq!(loaded, data);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn corrupt_file_falls_back_to_empty() {
        // Arrange
        let root = temp_dir("corrupt");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("layouts.json"), "{ not json").unwrap();
        let dir = DataDir::at(&root);

        // Act
        let layouts = dir.load_layouts();

        // Assert
        assert!(layouts.layouts.is_empty());
        let _ = std::fs::remove_dir_all(&root);
    }
}
