use lucent_core::window::{EnumeratedWindow, WindowApi};
use lucent_core::{Error, Rect, Result, opacity};
use windows::Win32::Foundation::{
    COLORREF, ERROR_INVALID_WINDOW_HANDLE, ERROR_SUCCESS, GetLastError, HWND, SetLastError,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GWL_EXSTYLE, GetForegroundWindow, GetLayeredWindowAttributes, GetWindowLongPtrW,
    HWND_NOTOPMOST, HWND_TOPMOST, LAYERED_WINDOW_ATTRIBUTES_FLAGS, LWA_ALPHA, SWP_NOACTIVATE,
    SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, SetLayeredWindowAttributes, SetWindowLongPtrW,
    SetWindowPos, WS_EX_LAYERED, WS_EX_TOPMOST, WS_EX_TRANSPARENT,
};

use crate::{enumerate, frame, hwnd, monitor};

/// The live desktop, accessed through Win32.
///
/// Stateless: every call goes straight to the OS, so one instance can be
/// shared by the poll thread, the hook thread and the linked-drag timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32WindowApi;

impl WindowApi for Win32WindowApi {
    fn enumerate(&self) -> Result<Vec<EnumeratedWindow>> {
        enumerate::enumerate_windows()
    }

    fn rect(&self, handle: usize) -> Result<Rect> {
        frame::visible_rect(hwnd(handle))
    }

    fn set_rect(&self, handle: usize, rect: &Rect) -> Result<()> {
        let hwnd = hwnd(handle);
        let target = frame::outer_rect(rect, &frame::border(hwnd)?);
        // SAFETY: SetWindowPos with a window handle; z-order is untouched.
        unsafe {
            SetWindowPos(
                hwnd,
                None,
                target.x,
                target.y,
                target.width,
                target.height,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .map_err(|e| os_error("SetWindowPos", handle, e))
    }

    fn opacity(&self, handle: usize) -> Result<u8> {
        let hwnd = hwnd(handle);
        if ex_style(hwnd)? & WS_EX_LAYERED.0 == 0 {
            return Ok(opacity::OPAQUE);
        }
        let mut alpha = 255u8;
        let mut flags = LAYERED_WINDOW_ATTRIBUTES_FLAGS(0);
        // SAFETY: the out-pointers are valid locals for the duration of the call.
        let read = unsafe {
            GetLayeredWindowAttributes(
                hwnd,
                None,
                Some(&mut alpha as *mut u8),
                Some(&mut flags as *mut LAYERED_WINDOW_ATTRIBUTES_FLAGS),
            )
        };
        // Layered through UpdateLayeredWindow: no alpha attribute to read.
        if read.is_err() || flags.0 & LWA_ALPHA.0 == 0 {
            return Ok(opacity::OPAQUE);
        }
        Ok(opacity::alpha_to_percent(alpha))
    }

    fn set_opacity(&self, handle: usize, percent: u8) -> Result<()> {
        let hwnd = hwnd(handle);
        let style = ex_style(hwnd)?;
        set_ex_style(hwnd, style | WS_EX_LAYERED.0)?;
        set_alpha(hwnd, opacity::percent_to_alpha(percent))
    }

    fn is_topmost(&self, handle: usize) -> Result<bool> {
        Ok(ex_style(hwnd(handle))? & WS_EX_TOPMOST.0 != 0)
    }

    fn set_topmost(&self, handle: usize, topmost: bool) -> Result<()> {
        let after = if topmost { HWND_TOPMOST } else { HWND_NOTOPMOST };
        // SAFETY: SetWindowPos with a z-order change only.
        unsafe {
            SetWindowPos(
                hwnd(handle),
                Some(after),
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )
        }
        .map_err(|e| os_error("SetWindowPos", handle, e))
    }

    fn is_click_through(&self, handle: usize) -> Result<bool> {
        Ok(ex_style(hwnd(handle))? & WS_EX_TRANSPARENT.0 != 0)
    }

    fn set_click_through(&self, handle: usize, enabled: bool) -> Result<()> {
        let hwnd = hwnd(handle);
        let style = ex_style(hwnd)?;
        if !enabled {
            return set_ex_style(hwnd, style & !WS_EX_TRANSPARENT.0);
        }
        set_ex_style(hwnd, style | WS_EX_TRANSPARENT.0 | WS_EX_LAYERED.0)?;
        // A freshly layered window without attributes is not drawn at all.
        if style & WS_EX_LAYERED.0 == 0 {
            set_alpha(hwnd, 255)?;
        }
        Ok(())
    }

    fn foreground(&self) -> Option<usize> {
        // SAFETY: GetForegroundWindow takes no arguments.
        let hwnd = unsafe { GetForegroundWindow() };
        (!hwnd.is_invalid()).then_some(hwnd.0 as usize)
    }

    fn monitor_id(&self, handle: usize) -> String {
        monitor::monitor_id(hwnd(handle))
    }
}

/// Reads the extended window style.
///
/// A zero result is ambiguous, so the last error is cleared first and
/// checked afterwards to tell "no styles" from "no window".
fn ex_style(hwnd: HWND) -> Result<u32> {
    // SAFETY: plain style query; last-error handling is thread-local.
    unsafe {
        SetLastError(ERROR_SUCCESS);
        let style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
        if style == 0 && GetLastError() != ERROR_SUCCESS {
            return Err(Error::WindowGone(hwnd.0 as usize));
        }
        Ok(style as u32)
    }
}

fn set_ex_style(hwnd: HWND, style: u32) -> Result<()> {
    // SAFETY: same ambiguity as `ex_style`; the previous value may be zero.
    unsafe {
        SetLastError(ERROR_SUCCESS);
        let previous = SetWindowLongPtrW(hwnd, GWL_EXSTYLE, style as isize);
        if previous == 0 && GetLastError() != ERROR_SUCCESS {
            return Err(Error::WindowGone(hwnd.0 as usize));
        }
    }
    Ok(())
}

fn set_alpha(hwnd: HWND, alpha: u8) -> Result<()> {
    // SAFETY: the window is layered at this point.
    unsafe { SetLayeredWindowAttributes(hwnd, COLORREF(0), alpha, LWA_ALPHA) }
        .map_err(|e| os_error("SetLayeredWindowAttributes", hwnd.0 as usize, e))
}

/// Maps a Win32 failure, treating an invalid handle as a closed window.
fn os_error(op: &'static str, handle: usize, e: windows::core::Error) -> Error {
    if e.code() == ERROR_INVALID_WINDOW_HANDLE.to_hresult() {
        Error::WindowGone(handle)
    } else {
        Error::os(op, e)
    }
}
