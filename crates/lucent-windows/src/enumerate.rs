use std::mem;

use lucent_core::window::EnumeratedWindow;
use lucent_core::{Error, Result};
use windows::Win32::Foundation::{HWND, LPARAM};
use windows::Win32::Graphics::Dwm::{DWMWA_CLOAKED, DwmGetWindowAttribute};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GWL_EXSTYLE, GetWindowLongPtrW, GetWindowTextLengthW, GetWindowTextW,
    GetWindowThreadProcessId, IsWindowVisible, WS_EX_TOOLWINDOW,
};
use windows::core::BOOL;

use crate::process;

/// Shell processes whose windows are never user content.
const BLOCKED_PROCESSES: &[&str] = &[
    "ApplicationFrameHost",
    "ShellExperienceHost",
    "StartMenuExperienceHost",
    "SearchUI",
    "SearchApp",
];

/// Lists the top-level windows a user would consider "open windows".
///
/// Skips invisible, untitled, cloaked and tool windows, windows owned by
/// this process and the shell processes in the blocklist.
pub fn enumerate_windows() -> Result<Vec<EnumeratedWindow>> {
    let mut handles: Vec<HWND> = Vec::new();

    // SAFETY: EnumWindows runs synchronously and calls back with each
    // top-level window. The Vec outlives the call, so handing a pointer
    // to it through LPARAM is sound.
    unsafe {
        EnumWindows(Some(collect_handle), LPARAM(&mut handles as *mut _ as isize))
            .map_err(|e| Error::os("EnumWindows", e))?;
    }

    let own_pid = std::process::id();
    Ok(handles
        .into_iter()
        .filter_map(|hwnd| describe(hwnd, own_pid))
        .collect())
}

unsafe extern "system" fn collect_handle(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam is the Vec pointer passed by enumerate_windows().
    let handles = unsafe { &mut *(lparam.0 as *mut Vec<HWND>) };
    handles.push(hwnd);
    BOOL(1)
}

/// Builds the identity of a window, or `None` if it should be skipped.
fn describe(hwnd: HWND, own_pid: u32) -> Option<EnumeratedWindow> {
    // SAFETY: read-only queries on a handle from EnumWindows. A window
    // closing in between just makes them fail or return empty values.
    unsafe {
        if !IsWindowVisible(hwnd).as_bool() {
            return None;
        }
        let ex_style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE) as u32;
        if ex_style & WS_EX_TOOLWINDOW.0 != 0 {
            return None;
        }
    }
    if is_cloaked(hwnd) {
        return None;
    }

    let title = window_title(hwnd);
    if title.trim().is_empty() {
        return None;
    }

    let mut pid = 0u32;
    // SAFETY: writes the owning process id into `pid`.
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32)) };
    if pid == 0 || pid == own_pid {
        return None;
    }

    let process_name = process::process_name(pid);
    if BLOCKED_PROCESSES
        .iter()
        .any(|blocked| blocked.eq_ignore_ascii_case(&process_name))
    {
        return None;
    }

    Some(EnumeratedWindow {
        hwnd: hwnd.0 as usize,
        title,
        process_name,
        process_id: pid,
    })
}

/// Whether DWM hides the window (suspended UWP apps, other virtual desktops).
fn is_cloaked(hwnd: HWND) -> bool {
    let mut cloaked = 0u32;
    // SAFETY: DWM writes a DWORD into `cloaked`; the size matches.
    let result = unsafe {
        DwmGetWindowAttribute(
            hwnd,
            DWMWA_CLOAKED,
            &mut cloaked as *mut u32 as *mut _,
            mem::size_of::<u32>() as u32,
        )
    };
    result.is_ok() && cloaked != 0
}

fn window_title(hwnd: HWND) -> String {
    // SAFETY: the buffer is sized from GetWindowTextLengthW plus the
    // terminating null.
    unsafe {
        let len = GetWindowTextLengthW(hwnd);
        if len <= 0 {
            return String::new();
        }
        let mut buffer = vec![0u16; len as usize + 1];
        let copied = GetWindowTextW(hwnd, &mut buffer);
        String::from_utf16_lossy(&buffer[..copied.max(0) as usize])
    }
}
