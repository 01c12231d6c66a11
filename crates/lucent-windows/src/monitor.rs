use std::mem;

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    GetMonitorInfoW, MONITOR_DEFAULTTONEAREST, MONITORINFO, MONITORINFOEXW, MonitorFromWindow,
};

/// Returns the device name of the monitor showing most of the window,
/// e.g. `\\.\DISPLAY1`. Empty if the monitor cannot be queried.
pub fn monitor_id(hwnd: HWND) -> String {
    // SAFETY: MonitorFromWindow always returns a monitor with DEFAULTTONEAREST.
    let monitor = unsafe { MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST) };

    let mut info = MONITORINFOEXW::default();
    info.monitorInfo.cbSize = mem::size_of::<MONITORINFOEXW>() as u32;

    // SAFETY: cbSize announces the extended struct, so the device name
    // field is filled in as well.
    let ok = unsafe { GetMonitorInfoW(monitor, &mut info as *mut MONITORINFOEXW as *mut MONITORINFO) };
    if !ok.as_bool() {
        return String::new();
    }

    let len = info
        .szDevice
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(info.szDevice.len());
    String::from_utf16_lossy(&info.szDevice[..len])
}
