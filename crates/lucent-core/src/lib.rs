pub mod apply;
pub mod config;
pub mod error;
pub mod grouping;
pub mod hotkey;
pub mod ipc;
pub mod layout;
pub mod linked_drag;
pub mod logging;
pub mod opacity;
pub mod pid;
pub mod preset;
pub mod rect;
pub mod registry;
pub mod session;
pub mod store;
pub mod wheel;
pub mod window;

#[cfg(test)]
pub(crate) mod fake;

pub use config::Settings;
pub use error::{Error, Result};
pub use grouping::{GroupId, GroupKind, GroupingEngine, WindowGroup};
pub use hotkey::{HotkeyAction, HotkeySetting, Modifier};
pub use ipc::{Command, PIPE_NAME, Response};
pub use layout::{LayoutEntry, WindowLayout};
pub use linked_drag::LinkedDragCoordinator;
pub use preset::{CascadeDirection, WindowPreset};
pub use rect::Rect;
pub use registry::WindowRegistry;
pub use session::Session;
pub use window::{WindowApi, WindowRecord};
