use serde::{Deserialize, Serialize};

use crate::grouping::GroupId;
use crate::{Rect, Result};

/// Identity of a top-level window as reported by enumeration.
///
/// Everything else about the window is queried separately, and any of
/// those queries may fail if the window closes in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedWindow {
    pub hwnd: usize,
    pub title: String,
    pub process_name: String,
    pub process_id: u32,
}

/// The OS window access capability the engine depends on.
///
/// The platform crate implements this over Win32; tests use an
/// in-memory fake. Implementations must be callable from any thread:
/// the poll runs on a worker, the linked-drag handler on the hook
/// thread and its timer on another.
pub trait WindowApi: Send + Sync {
    /// Lists trackable top-level windows.
    ///
    /// Implementations exclude the host process, invisible, untitled,
    /// tool and cloaked windows, and blocklisted shell processes.
    fn enumerate(&self) -> Result<Vec<EnumeratedWindow>>;

    /// Returns the window's visible bounds.
    fn rect(&self, hwnd: usize) -> Result<Rect>;

    /// Moves and resizes the window.
    fn set_rect(&self, hwnd: usize, rect: &Rect) -> Result<()>;

    /// Resizes the window in place.
    fn set_size(&self, hwnd: usize, width: i32, height: i32) -> Result<()> {
        let rect = self.rect(hwnd)?;
        self.set_rect(hwnd, &Rect::new(rect.x, rect.y, width, height))
    }

    /// Returns the opacity in percent. Non-layered windows report 100.
    fn opacity(&self, hwnd: usize) -> Result<u8>;

    /// Sets the opacity in percent, switching the window to layered mode.
    fn set_opacity(&self, hwnd: usize, percent: u8) -> Result<()>;

    fn is_topmost(&self, hwnd: usize) -> Result<bool>;

    fn set_topmost(&self, hwnd: usize, topmost: bool) -> Result<()>;

    fn is_click_through(&self, hwnd: usize) -> Result<bool>;

    /// Toggles input transparency. Enabling it always ensures the
    /// layered style is present.
    fn set_click_through(&self, hwnd: usize, enabled: bool) -> Result<()>;

    /// Returns the current foreground window, if any.
    fn foreground(&self) -> Option<usize>;

    /// Returns an identifier for the monitor the window is on.
    fn monitor_id(&self, _hwnd: usize) -> String {
        String::new()
    }
}

/// One tracked top-level window and its last observed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub hwnd: usize,
    pub title: String,
    pub process_name: String,
    pub process_id: u32,
    pub rect: Rect,
    /// Opacity in percent, 0–100.
    pub opacity: u8,
    pub topmost: bool,
    pub click_through: bool,
    pub active: bool,
    pub group_id: Option<GroupId>,
    pub monitor_id: String,
    pub include_in_linked_drag: bool,
}

impl WindowRecord {
    /// Creates a record with default presentation state for a window.
    pub fn new(hwnd: usize, title: impl Into<String>, process_name: impl Into<String>) -> Self {
        Self {
            hwnd,
            title: title.into(),
            process_name: process_name.into(),
            process_id: 0,
            rect: Rect::default(),
            opacity: crate::opacity::OPAQUE,
            topmost: false,
            click_through: false,
            active: false,
            group_id: None,
            monitor_id: String::new(),
            include_in_linked_drag: true,
        }
    }

    /// Builds a full record by querying the OS for everything past identity.
    ///
    /// Fails if the window vanished mid-query; callers drop it for this cycle.
    pub fn observe(api: &dyn WindowApi, info: EnumeratedWindow) -> Result<Self> {
        let hwnd = info.hwnd;
        Ok(Self {
            rect: api.rect(hwnd)?,
            opacity: api.opacity(hwnd)?,
            topmost: api.is_topmost(hwnd)?,
            click_through: api.is_click_through(hwnd)?,
            monitor_id: api.monitor_id(hwnd),
            process_id: info.process_id,
            ..Self::new(hwnd, info.title, info.process_name)
        })
    }
}
