//! Win32 backend for Lucent.
//!
//! Everything here talks to the OS directly. The crate is empty on other
//! platforms so the workspace still builds there.
#![cfg(windows)]

/// `WindowApi` over Win32 window styles and layered attributes.
pub mod api;

/// Daemon main loop.
pub mod daemon;

/// Per-monitor DPI awareness.
pub mod dpi;

/// Top-level window enumeration with filtering.
pub mod enumerate;

/// OS hooks and the message pump thread.
mod event_loop;

/// Visible frame bounds.
pub mod frame;

/// Global hotkey registration.
pub mod hotkey;

/// IPC via Named Pipes.
pub mod ipc;

mod keys;

/// Monitor identification.
pub mod monitor;

/// Process utilities (name lookup, alive check).
pub mod process;

/// System light/dark theme detection.
pub mod theme;

pub use api::Win32WindowApi;
pub use enumerate::enumerate_windows;

use windows::Win32::Foundation::HWND;

/// Converts a raw handle value from the engine into an `HWND`.
pub(crate) fn hwnd(handle: usize) -> HWND {
    HWND(handle as *mut _)
}
