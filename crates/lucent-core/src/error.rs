use thiserror::Error;

/// Errors raised by the Lucent engine and its platform backends.
#[derive(Debug, Error)]
pub enum Error {
    /// The window disappeared between enumeration and a property query.
    #[error("window 0x{0:X} no longer exists")]
    WindowGone(usize),

    /// A raw OS call failed.
    #[error("{op} failed: {message}")]
    Os { op: &'static str, message: String },

    /// An OS hook (WinEvent, low-level mouse) could not be installed.
    #[error("failed to install {0} hook")]
    Hook(&'static str),

    /// A hotkey chord was rejected or could not be registered.
    #[error("hotkey {chord}: {reason}")]
    Hotkey { chord: String, reason: String },

    #[error("no group with id {0}")]
    UnknownGroup(String),

    #[error("no preset with id {0}")]
    UnknownPreset(String),

    #[error("no layout with id {0}")]
    UnknownLayout(String),

    #[error("window 0x{0:X} is not tracked")]
    UnknownWindow(usize),

    /// The daemon could not be reached or replied with garbage.
    #[error("ipc: {0}")]
    Ipc(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Builds an [`Error::Os`] from an operation name and any displayable cause.
    pub fn os(op: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::Os {
            op,
            message: cause.to_string(),
        }
    }

    /// Whether the error is the routine kind produced by window churn.
    ///
    /// Transient errors are skipped for the current cycle and never
    /// surfaced to the user.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::WindowGone(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
