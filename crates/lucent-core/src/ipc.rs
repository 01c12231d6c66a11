use serde::{Deserialize, Serialize};

use crate::Rect;

/// The named pipe path used for IPC between CLI and daemon.
pub const PIPE_NAME: &str = r"\\.\pipe\lucent";

/// What a preset is applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresetTarget {
    Window { hwnd: usize },
    /// Group id or name.
    Group { group: String },
}

/// A command sent from the CLI to the daemon.
///
/// Serialized as one line of JSON over the named pipe. Groups, presets
/// and layouts are referenced by id or by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Stop,
    Status,
    /// Force a window list refresh before the next poll.
    Refresh,
    ListWindows,
    SetOpacity { hwnd: usize, percent: u8 },
    ToggleTopmost { hwnd: usize },
    ToggleClickThrough { hwnd: usize },
    MoveWindow { hwnd: usize, rect: Rect },
    /// Opacity for every tracked window; `None` uses the configured default.
    BulkOpacity { percent: Option<u8> },

    ListGroups,
    /// Rebuild every process group from scratch; manual groups are kept.
    RegroupByProcess,
    CreateGroup { name: String, windows: Vec<usize> },
    AddToGroup { group: String, hwnd: usize },
    RemoveFromGroup { group: String, hwnd: usize },
    DeleteGroup { group: String },
    SetLinkedDrag { group: String, enabled: bool },
    SetIncludeInLinkedDrag { hwnd: usize, included: bool },

    ListPresets,
    CreatePreset { name: String },
    PresetFromWindow { name: String, hwnd: usize },
    PresetFromGroup { name: String, group: String },
    DuplicatePreset { preset: String },
    DeletePreset { preset: String },
    ApplyPreset { preset: String, target: PresetTarget },

    ListLayouts,
    CaptureLayout { name: String },
    UpdateLayout { layout: String },
    RestoreLayout { layout: String },
    DeleteLayout { layout: String },

    SaveSettings,
}

/// A response sent from the daemon back to the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: ResponseStatus,
    /// Optional human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured payload for list commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Status of a daemon response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            status: ResponseStatus::Ok,
            message: None,
            data: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok()
        }
    }

    pub fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}
