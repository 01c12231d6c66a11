use std::mem;

use lucent_core::config::Theme;
use windows::Win32::Foundation::ERROR_SUCCESS;
use windows::Win32::System::Registry::{HKEY_CURRENT_USER, RRF_RT_REG_DWORD, RegGetValueW};
use windows::core::w;

/// Resolves `Theme::System` to the OS app theme; explicit choices pass through.
pub fn resolve(theme: Theme) -> Theme {
    match theme {
        Theme::System => system_theme(),
        explicit => explicit,
    }
}

/// Reads `AppsUseLightTheme` from the personalisation key. Dark when the
/// value is missing.
fn system_theme() -> Theme {
    let mut value = 0u32;
    let mut size = mem::size_of::<u32>() as u32;

    // SAFETY: RegGetValueW writes at most `size` bytes into `value`.
    let status = unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            w!(r"Software\Microsoft\Windows\CurrentVersion\Themes\Personalize"),
            w!("AppsUseLightTheme"),
            RRF_RT_REG_DWORD,
            None,
            Some(&mut value as *mut u32 as *mut _),
            Some(&mut size as *mut u32),
        )
    };

    if status == ERROR_SUCCESS && value != 0 {
        Theme::Light
    } else {
        Theme::Dark
    }
}
