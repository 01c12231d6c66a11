use std::mem;

use lucent_core::{Error, Rect, Result};
use windows::Win32::Foundation::{HWND, RECT};
use windows::Win32::Graphics::Dwm::{DWMWA_EXTENDED_FRAME_BOUNDS, DwmGetWindowAttribute};
use windows::Win32::UI::WindowsAndMessaging::GetWindowRect;

/// Width of the invisible resize border on each side of a window.
///
/// `GetWindowRect` includes the drop-shadow area on Windows 10/11; DWM's
/// extended frame bounds do not.
#[derive(Debug, Default, Clone, Copy)]
pub struct Border {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Returns what the user sees as the window, without the shadow border.
pub fn visible_rect(hwnd: HWND) -> Result<Rect> {
    let frame = visible_bounds(hwnd)?;
    Ok(to_rect(&frame))
}

/// Returns the shadow border around the visible frame.
pub fn border(hwnd: HWND) -> Result<Border> {
    let outer = window_rect(hwnd)?;
    let inner = visible_bounds(hwnd)?;
    Ok(Border {
        left: inner.left - outer.left,
        top: inner.top - outer.top,
        right: outer.right - inner.right,
        bottom: outer.bottom - inner.bottom,
    })
}

/// Grows a visible rect by the border, giving the rect to pass to `SetWindowPos`.
pub fn outer_rect(rect: &Rect, border: &Border) -> Rect {
    Rect::new(
        rect.x - border.left,
        rect.y - border.top,
        rect.width + border.left + border.right,
        rect.height + border.top + border.bottom,
    )
}

fn visible_bounds(hwnd: HWND) -> Result<RECT> {
    let mut frame = RECT::default();
    // SAFETY: DWM writes a RECT into our buffer; the size matches.
    let dwm = unsafe {
        DwmGetWindowAttribute(
            hwnd,
            DWMWA_EXTENDED_FRAME_BOUNDS,
            &mut frame as *mut RECT as *mut _,
            mem::size_of::<RECT>() as u32,
        )
    };
    match dwm {
        Ok(()) => Ok(frame),
        // Not composited (or already gone): fall back to the plain rect.
        Err(_) => window_rect(hwnd),
    }
}

fn window_rect(hwnd: HWND) -> Result<RECT> {
    let mut rect = RECT::default();
    // SAFETY: GetWindowRect only writes into the provided RECT.
    unsafe { GetWindowRect(hwnd, &mut rect) }.map_err(|_| Error::WindowGone(hwnd.0 as usize))?;
    Ok(rect)
}

fn to_rect(r: &RECT) -> Rect {
    Rect::new(r.left, r.top, r.right - r.left, r.bottom - r.top)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_rect_adds_shadow_border() {
        // Arrange
        let border = Border {
            left: 7,
            top: 0,
            right: 7,
            bottom: 7,
        };

        // Act
        let outer = outer_rect(&Rect::new(100, 100, 800, 600), &border);

        // Assert
        assert_eq!(outer, Rect::new(93, 100, 814, 607));
    }
}
