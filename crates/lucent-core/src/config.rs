//! User settings, loaded from `~/.config/lucent/settings.toml`.
//!
//! Missing sections fall back to defaults via `#[serde(default)]`; a
//! missing or corrupt file yields the built-in defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::hotkey::{self, HotkeySetting};
use crate::logging::LogConfig;
use crate::{Rect, Result};

/// Colour scheme for anything the daemon draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the OS app theme.
    #[default]
    System,
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    /// Percent applied by the bulk-opacity action when none is given.
    pub bulk_opacity: u8,
    /// Percent per Ctrl+wheel notch.
    pub opacity_step: u8,
    pub hotkeys_enabled: bool,
    /// Window list refresh interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Last bounds of the control window.
    pub window: Rect,
    #[serde(rename = "hotkey")]
    pub hotkeys: Vec<HotkeySetting>,
    pub linked_drag: LinkedDragConfig,
    pub wheel: WheelConfig,
    pub logging: LogConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            bulk_opacity: 70,
            opacity_step: 5,
            hotkeys_enabled: true,
            poll_interval_ms: 2000,
            window: Rect::new(100, 100, 900, 600),
            hotkeys: hotkey::defaults(),
            linked_drag: LinkedDragConfig::default(),
            wheel: WheelConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Linked-drag timing and guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedDragConfig {
    /// Quiet period after the last leader move before peers follow.
    pub debounce_ms: u64,
    /// How long a corrected peer ignores its own move notifications.
    pub suppress_ms: u64,
    /// Moves larger than this on either axis are discarded.
    pub max_delta: i32,
    /// Moves at or below this on both axes are ignored.
    pub threshold: i32,
}

impl Default for LinkedDragConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            suppress_ms: 200,
            max_delta: 500,
            threshold: 1,
        }
    }
}

/// Ctrl + mouse wheel opacity adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub enabled: bool,
    /// Minimum time between two handled wheel events.
    pub min_interval_ms: u64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_ms: 50,
        }
    }
}

impl Settings {
    /// Clamps values to safe ranges and restores missing default hotkeys.
    pub fn validate(&mut self) {
        self.bulk_opacity = self.bulk_opacity.clamp(1, 100);
        self.opacity_step = self.opacity_step.clamp(1, 50);
        self.poll_interval_ms = self.poll_interval_ms.clamp(250, 60_000);
        self.linked_drag.debounce_ms = self.linked_drag.debounce_ms.clamp(10, 2000);
        self.linked_drag.suppress_ms = self.linked_drag.suppress_ms.clamp(50, 5000);
        self.linked_drag.max_delta = self.linked_drag.max_delta.clamp(10, 10_000);
        self.linked_drag.threshold = self.linked_drag.threshold.clamp(0, 50);
        self.wheel.min_interval_ms = self.wheel.min_interval_ms.min(1000);
        hotkey::merge_defaults(&mut self.hotkeys);
    }
}

/// Returns the config directory: `~/.config/lucent/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".config").join("lucent"))
}

/// Returns the settings file path: `~/.config/lucent/settings.toml`.
pub fn settings_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("settings.toml"))
}

/// Parses settings text and validates the result.
pub fn parse(content: &str) -> Result<Settings> {
    let mut settings: Settings = toml::from_str(content)?;
    settings.validate();
    Ok(settings)
}

/// Tries to load and parse `settings.toml`.
pub fn try_load() -> Result<Settings> {
    let path = settings_path().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "could not determine config path")
    })?;
    let content = std::fs::read_to_string(&path)?;
    parse(&content)
}

/// Loads settings from disk, falling back to defaults.
///
/// A missing file silently yields defaults; other errors are logged.
pub fn load() -> Settings {
    load_or_default(try_load, Settings::default)
}

/// Writes settings to `settings.toml`, creating the directory if needed.
pub fn save(settings: &Settings) -> Result<()> {
    let Some(path) = settings_path() else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, toml::to_string_pretty(settings)?)?;
    Ok(())
}

/// Runs `try_load`, returning `default()` on any failure.
///
/// Missing files are expected on first run and are not logged.
pub(crate) fn load_or_default<T>(
    try_load: impl FnOnce() -> Result<T>,
    default: impl Fn() -> T,
) -> T {
    match try_load() {
        Ok(val) => val,
        Err(crate::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => default(),
        Err(e) => {
            log::warn!("Falling back to defaults: {e}");
            default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::HotkeyAction;

    #[test]
    fn empty_file_yields_defaults() {
        // Arrange
        let content = "";

        // Act
        let settings = parse(content).unwrap();

        // Assert
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        // Arrange
        let content = "bulk_opacity = 55\n[linked_drag]\ndebounce_ms = 150\n";

        // Act
        let settings = parse(content).unwrap();

        // Assert
        assert_eq!(settings.bulk_opacity, 55);
        assert_eq!(settings.linked_drag.debounce_ms, 150);
        assert_eq!(settings.linked_drag.suppress_ms, 200);
        assert_eq!(settings.wheel.min_interval_ms, 50);
    }

    #[test]
    fn validate_clamps_out_of_range_values() {
        // Arrange
        let mut settings = Settings {
            bulk_opacity: 0,
            opacity_step: 200,
            poll_interval_ms: 1,
            ..Settings::default()
        };

        // Act
        settings.validate();

        // Assert
        assert_eq!(settings.bulk_opacity, 1);
        assert_eq!(settings.opacity_step, 50);
        assert_eq!(settings.poll_interval_ms, 250);
    }

    #[test]
    fn missing_hotkeys_are_merged_from_defaults() {
        // Arrange
        let content = r#"
[[hotkey]]
action = "toggle_topmost"
key = "P"
modifiers = ["win"]
"#;

        // Act
        let settings = parse(content).unwrap();

        // Assert
        assert_eq!(settings.hotkeys.len(), hotkey::defaults().len());
        assert_eq!(settings.hotkeys[0].action, HotkeyAction::ToggleTopmost);
        assert_eq!(settings.hotkeys[0].key, "P");
    }

    #[test]
    fn corrupt_file_is_an_error() {
        // Arrange
        let content = "bulk_opacity = \"lots\"";

        // Act
        let result = parse(content);

        // Assert
        assert!(matches!(result, Err(crate::Error::TomlDe(_))));
    }

    #[test]
    fn load_or_default_swallows_failures() {
        // Arrange
        let failing = || -> Result<u8> { Err(crate::Error::Ipc("broken".into())) };

        // Act
        let value = load_or_default(failing, || 7);

        // Assert
        assert_eq!(value, 7);
    }

    #[test]
    fn theme_serialises_lowercase() {
        // Arrange
        let settings = Settings {
            theme: Theme::Dark,
            ..Settings::default()
        };

        // Act
        let text = toml::to_string(&settings).unwrap();

        // Assert
        assert!(text.contains("theme = \"dark\""));
    }
}
