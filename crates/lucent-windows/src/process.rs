use std::path::Path;

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_ACCESS_RIGHTS, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
    PROCESS_TERMINATE, QueryFullProcessImageNameW, TerminateProcess,
};
use windows::core::PWSTR;

/// An open process handle, closed on drop.
struct ProcessHandle(HANDLE);

impl ProcessHandle {
    fn open(pid: u32, access: PROCESS_ACCESS_RIGHTS) -> Option<Self> {
        // SAFETY: OpenProcess either fails or hands us a handle we own.
        unsafe { OpenProcess(access, false, pid) }.ok().map(Self)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // SAFETY: the handle is owned exclusively by this guard.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// Returns the executable name of a process without the extension,
/// e.g. `notepad` for `C:\Windows\notepad.exe`.
///
/// Empty when the process cannot be queried (exited, or elevated while
/// we are not).
pub fn process_name(pid: u32) -> String {
    let Some(process) = ProcessHandle::open(pid, PROCESS_QUERY_LIMITED_INFORMATION) else {
        return String::new();
    };

    let mut buffer = [0u16; 1024];
    let mut len = buffer.len() as u32;
    // SAFETY: `len` holds the buffer capacity and is updated with the
    // number of characters written.
    let queried = unsafe {
        QueryFullProcessImageNameW(
            process.0,
            PROCESS_NAME_WIN32,
            PWSTR(buffer.as_mut_ptr()),
            &mut len,
        )
    };
    if queried.is_err() {
        return String::new();
    }

    let path = String::from_utf16_lossy(&buffer[..len as usize]);
    Path::new(&path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Checks whether a process with the given PID is still alive.
///
/// Used to tell a hung daemon from a stale PID file.
pub fn is_process_alive(pid: u32) -> bool {
    ProcessHandle::open(pid, PROCESS_QUERY_LIMITED_INFORMATION).is_some()
}

/// Forcibly terminates a process. Returns `false` if it could not be opened
/// or killed.
pub fn kill_process(pid: u32) -> bool {
    let Some(process) = ProcessHandle::open(pid, PROCESS_TERMINATE) else {
        return false;
    };
    // SAFETY: the handle was opened with PROCESS_TERMINATE.
    unsafe { TerminateProcess(process.0, 1) }.is_ok()
}
