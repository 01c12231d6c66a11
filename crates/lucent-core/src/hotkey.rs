//! Global hotkey model: chords, actions and the dispatcher that maps one
//! to the other.
//!
//! OS registration lives in the platform crate; this module only decides
//! which chords are valid and what each one does.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What a hotkey does. Every action targets the foreground window
/// except [`HotkeyAction::SetAllOpacity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeyAction {
    /// Set opacity to `parameter` percent.
    SetOpacity,
    /// Raise opacity by `parameter` percent.
    IncreaseOpacity,
    /// Lower opacity by `parameter` percent.
    DecreaseOpacity,
    ToggleTopmost,
    ToggleClickThrough,
    /// Set every tracked window to `parameter` percent.
    SetAllOpacity,
    /// Apply the preset at index `parameter`.
    ApplyPreset,
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SetOpacity => "set-opacity",
            Self::IncreaseOpacity => "increase-opacity",
            Self::DecreaseOpacity => "decrease-opacity",
            Self::ToggleTopmost => "toggle-topmost",
            Self::ToggleClickThrough => "toggle-click-through",
            Self::SetAllOpacity => "set-all-opacity",
            Self::ApplyPreset => "apply-preset",
        };
        f.write_str(name)
    }
}

/// Keyboard modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Win,
}

impl Modifier {
    fn label(self) -> &'static str {
        match self {
            Self::Ctrl => "Ctrl",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
            Self::Win => "Win",
        }
    }
}

/// A user-configured hotkey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotkeySetting {
    pub action: HotkeyAction,
    /// Action argument, e.g. the opacity step or preset index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<i32>,
    /// Key name (e.g. "T", "Up", "0", "F1").
    pub key: String,
    pub modifiers: Vec<Modifier>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// The resolved effect of a hotkey press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyCommand {
    pub action: HotkeyAction,
    pub parameter: Option<i32>,
}

impl HotkeySetting {
    pub fn new(action: HotkeyAction, parameter: Option<i32>, key: &str, modifiers: &[Modifier]) -> Self {
        Self {
            action,
            parameter,
            key: key.into(),
            modifiers: modifiers.to_vec(),
            enabled: true,
        }
    }

    pub fn chord(&self) -> Chord {
        Chord::new(&self.modifiers, &self.key)
    }

    pub fn command(&self) -> HotkeyCommand {
        HotkeyCommand {
            action: self.action,
            parameter: self.parameter,
        }
    }

    /// Rejects chords without a modifier or without a key.
    ///
    /// A bare key would swallow normal typing system-wide.
    pub fn validate(&self) -> Result<()> {
        let chord = self.chord().to_string();
        if self.key.trim().is_empty() {
            return Err(Error::Hotkey {
                chord,
                reason: "missing key".into(),
            });
        }
        if self.modifiers.is_empty() {
            return Err(Error::Hotkey {
                chord,
                reason: "at least one modifier is required".into(),
            });
        }
        Ok(())
    }
}

/// A normalised key combination: sorted, deduplicated modifiers and an
/// upper-case key name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord {
    pub modifiers: Vec<Modifier>,
    pub key: String,
}

impl Chord {
    pub fn new(modifiers: &[Modifier], key: &str) -> Self {
        let mut modifiers = modifiers.to_vec();
        modifiers.sort();
        modifiers.dedup();
        Self {
            modifiers,
            key: key.trim().to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{}+", m.label())?;
        }
        f.write_str(&self.key)
    }
}

/// Returns the built-in hotkeys.
///
/// Ctrl+Alt+Up/Down: opacity ±10
/// Ctrl+Alt+0: opacity 100
/// Ctrl+Alt+T: toggle topmost
/// Ctrl+Alt+C: toggle click-through
pub fn defaults() -> Vec<HotkeySetting> {
    use HotkeyAction::*;
    use Modifier::{Alt, Ctrl};

    vec![
        HotkeySetting::new(IncreaseOpacity, Some(10), "Up", &[Ctrl, Alt]),
        HotkeySetting::new(DecreaseOpacity, Some(10), "Down", &[Ctrl, Alt]),
        HotkeySetting::new(SetOpacity, Some(100), "0", &[Ctrl, Alt]),
        HotkeySetting::new(ToggleTopmost, None, "T", &[Ctrl, Alt]),
        HotkeySetting::new(ToggleClickThrough, None, "C", &[Ctrl, Alt]),
    ]
}

/// Appends default hotkeys whose action is missing from `loaded`.
///
/// Existing entries are never replaced, so user customisations survive.
pub fn merge_defaults(loaded: &mut Vec<HotkeySetting>) {
    for default in defaults() {
        if !loaded.iter().any(|h| h.action == default.action) {
            loaded.push(default);
        }
    }
}

/// Maps chords to commands. Built from settings, consulted on every press.
#[derive(Debug, Default)]
pub struct HotkeyDispatcher {
    bindings: Vec<(Chord, HotkeyCommand)>,
}

impl HotkeyDispatcher {
    /// Builds the table from enabled, valid settings.
    ///
    /// Invalid entries and duplicate chords are skipped and returned as
    /// errors so the caller can log them; the first binding for a chord
    /// wins.
    pub fn new(settings: &[HotkeySetting]) -> (Self, Vec<Error>) {
        let mut dispatcher = Self::default();
        let mut rejected = Vec::new();

        for setting in settings.iter().filter(|s| s.enabled) {
            if let Err(e) = setting.validate() {
                rejected.push(e);
                continue;
            }
            let chord = setting.chord();
            if dispatcher.dispatch(&chord).is_some() {
                rejected.push(Error::Hotkey {
                    chord: chord.to_string(),
                    reason: "already bound".into(),
                });
                continue;
            }
            dispatcher.bindings.push((chord, setting.command()));
        }
        (dispatcher, rejected)
    }

    pub fn dispatch(&self, chord: &Chord) -> Option<HotkeyCommand> {
        self.bindings
            .iter()
            .find(|(c, _)| c == chord)
            .map(|(_, command)| *command)
    }

    pub fn bindings(&self) -> &[(Chord, HotkeyCommand)] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_key_is_rejected() {
        // Arrange
        let setting = HotkeySetting::new(HotkeyAction::ToggleTopmost, None, "T", &[]);

        // Act
        let result = setting.validate();

        // Assert
        assert!(matches!(result, Err(Error::Hotkey { .. })));
    }

    #[test]
    fn chord_is_normalised() {
        // Arrange
        let a = Chord::new(&[Modifier::Alt, Modifier::Ctrl, Modifier::Alt], "t");

        // Act
        let b = Chord::new(&[Modifier::Ctrl, Modifier::Alt], "T");

        // Assert
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Ctrl+Alt+T");
    }

    #[test]
    fn merge_keeps_customised_entries() {
        // Arrange
        let mut loaded = vec![HotkeySetting::new(
            HotkeyAction::ToggleTopmost,
            None,
            "P",
            &[Modifier::Win],
        )];

        // Act
        merge_defaults(&mut loaded);

        // Assert
        assert_eq!(loaded.len(), defaults().len());
        let topmost: Vec<_> = loaded
            .iter()
            .filter(|h| h.action == HotkeyAction::ToggleTopmost)
            .collect();
        assert_eq!(topmost.len(), 1);
        assert_eq!(topmost[0].key, "P");
    }

    #[test]
    fn dispatcher_resolves_default_chords() {
        // Arrange
        let (dispatcher, rejected) = HotkeyDispatcher::new(&defaults());

        // Act
        let command = dispatcher.dispatch(&Chord::new(&[Modifier::Ctrl, Modifier::Alt], "up"));

        // Assert
        assert!(rejected.is_empty());
        assert_eq!(
            command,
            Some(HotkeyCommand {
                action: HotkeyAction::IncreaseOpacity,
                parameter: Some(10),
            })
        );
    }

    #[test]
    fn dispatcher_skips_disabled_invalid_and_duplicate_entries() {
        // Arrange
        let mut disabled = HotkeySetting::new(HotkeyAction::SetOpacity, Some(50), "5", &[Modifier::Ctrl]);
        disabled.enabled = false;
        let bare = HotkeySetting::new(HotkeyAction::SetOpacity, Some(40), "4", &[]);
        let first = HotkeySetting::new(HotkeyAction::ToggleTopmost, None, "T", &[Modifier::Alt]);
        let clash = HotkeySetting::new(HotkeyAction::ToggleClickThrough, None, "T", &[Modifier::Alt]);

        // Act
        let (dispatcher, rejected) = HotkeyDispatcher::new(&[disabled, bare, first, clash]);

        // Assert
        assert_eq!(dispatcher.bindings().len(), 1);
        assert_eq!(rejected.len(), 2);
        assert_eq!(
            dispatcher
                .dispatch(&Chord::new(&[Modifier::Alt], "T"))
                .map(|c| c.action),
            Some(HotkeyAction::ToggleTopmost)
        );
    }

    #[test]
    fn settings_round_trip_through_toml() {
        // Arrange
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            hotkey: Vec<HotkeySetting>,
        }
        let original = Wrapper { hotkey: defaults() };

        // Act
        let text = toml::to_string(&original).unwrap();
        let parsed: Wrapper = toml::from_str(&text).unwrap();

        // Assert
        assert_eq!(parsed.hotkey, original.hotkey);
        assert!(text.contains("action = \"increase_opacity\""));
    }
}
