use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, SetProcessDpiAwarenessContext,
};

/// Opts the process into per-monitor DPI awareness (V2).
///
/// Window rects are then reported and set in physical pixels on every
/// monitor, which linked drag and layout restore rely on. Call once at
/// startup before touching any window.
pub fn enable_dpi_awareness() {
    // SAFETY: fails harmlessly if awareness was already set by a manifest.
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }
}
