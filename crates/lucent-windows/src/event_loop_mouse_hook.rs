use std::cell::RefCell;
use std::sync::mpsc::Sender;
use std::time::Instant;

use lucent_core::Error;
use lucent_core::config::WheelConfig;
use lucent_core::wheel::WheelThrottle;
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, VK_CONTROL};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GA_ROOT, GetAncestor, HC_ACTION, HHOOK, MSLLHOOKSTRUCT, SetWindowsHookExW,
    UnhookWindowsHookEx, WH_MOUSE_LL, WM_MOUSEWHEEL, WindowFromPoint,
};

/// A Ctrl + wheel notch over a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WheelEvent {
    pub hwnd: usize,
    pub delta: i32,
}

struct WheelState {
    throttle: WheelThrottle,
    sender: Sender<WheelEvent>,
}

thread_local! {
    static WHEEL: RefCell<Option<WheelState>> = const { RefCell::new(None) };
}

/// Installs the low-level mouse hook on the calling thread.
///
/// On failure Ctrl+wheel opacity is inert for this run.
pub(super) fn install(config: &WheelConfig, sender: Sender<WheelEvent>) -> Option<HHOOK> {
    WHEEL.with(|cell| {
        *cell.borrow_mut() = Some(WheelState {
            throttle: WheelThrottle::new(config),
            sender,
        });
    });

    // SAFETY: global low-level hook; the callback runs on this thread
    // while it pumps messages.
    match unsafe { SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_proc), None, 0) } {
        Ok(hook) => Some(hook),
        Err(e) => {
            log::error!("{} ({e}); Ctrl+wheel opacity disabled", Error::Hook("mouse"));
            WHEEL.with(|cell| cell.borrow_mut().take());
            None
        }
    }
}

pub(super) fn uninstall(hook: HHOOK) {
    // SAFETY: the hook was installed by `install` on this thread.
    unsafe {
        let _ = UnhookWindowsHookEx(hook);
    }
    WHEEL.with(|cell| cell.borrow_mut().take());
}

/// Must return quickly: Windows silently drops slow low-level hooks.
unsafe extern "system" fn mouse_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 && wparam.0 as u32 == WM_MOUSEWHEEL {
        // SAFETY: for WH_MOUSE_LL, lparam points to an MSLLHOOKSTRUCT.
        let info = unsafe { &*(lparam.0 as *const MSLLHOOKSTRUCT) };
        if handle_wheel(info) {
            return LRESULT(1);
        }
    }
    // SAFETY: pass everything else along the hook chain.
    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}

/// Returns `true` if the event was consumed.
///
/// Throttled events are consumed too, so the window underneath does not
/// zoom or scroll while the user is adjusting opacity.
fn handle_wheel(info: &MSLLHOOKSTRUCT) -> bool {
    // SAFETY: key state query; the high bit means "currently down".
    let ctrl_down = unsafe { GetAsyncKeyState(i32::from(VK_CONTROL.0)) } < 0;
    if !ctrl_down {
        return false;
    }

    // SAFETY: plain lookups by screen point.
    let target = unsafe { GetAncestor(WindowFromPoint(info.pt), GA_ROOT) };
    if target.is_invalid() {
        return false;
    }
    let delta = i32::from((info.mouseData >> 16) as u16 as i16);

    WHEEL.with(|cell| {
        let mut state = cell.borrow_mut();
        let Some(state) = state.as_mut() else {
            return false;
        };
        if state.throttle.admit(Instant::now()) {
            let _ = state.sender.send(WheelEvent {
                hwnd: target.0 as usize,
                delta,
            });
        }
        true
    })
}
