use lucent_core::Error;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Accessibility::{HWINEVENTHOOK, SetWinEventHook, UnhookWinEvent};
use windows::Win32::UI::WindowsAndMessaging::{
    EVENT_OBJECT_LOCATIONCHANGE, WINEVENT_OUTOFCONTEXT, WINEVENT_SKIPOWNPROCESS,
};

use crate::frame;

use super::LINKED_DRAG;

/// Object id of the window itself rather than a caret, cursor or child.
const OBJID_WINDOW: i32 = 0;
const CHILDID_SELF: i32 = 0;

/// Subscribes to location changes of every top-level window.
///
/// On failure linked drag is inert for this run.
pub(super) fn install() -> Option<HWINEVENTHOOK> {
    // SAFETY: out-of-context hook; the callback runs on this thread
    // while it pumps messages.
    let hook = unsafe {
        SetWinEventHook(
            EVENT_OBJECT_LOCATIONCHANGE,
            EVENT_OBJECT_LOCATIONCHANGE,
            None,
            Some(win_event_proc),
            0,
            0,
            WINEVENT_OUTOFCONTEXT | WINEVENT_SKIPOWNPROCESS,
        )
    };
    if hook.is_invalid() {
        log::error!("{}; linked drag disabled", Error::Hook("location change"));
        return None;
    }
    Some(hook)
}

pub(super) fn uninstall(hook: HWINEVENTHOOK) {
    // SAFETY: the hook was installed by `install` on this thread.
    unsafe {
        let _ = UnhookWinEvent(hook);
    }
}

unsafe extern "system" fn win_event_proc(
    _hook: HWINEVENTHOOK,
    event: u32,
    hwnd: HWND,
    id_object: i32,
    id_child: i32,
    _event_thread: u32,
    _event_time: u32,
) {
    if event != EVENT_OBJECT_LOCATIONCHANGE || id_object != OBJID_WINDOW || id_child != CHILDID_SELF {
        return;
    }

    let coordinator = LINKED_DRAG.with(|cell| cell.borrow().clone());
    let Some(coordinator) = coordinator else {
        return;
    };
    // Closed between the event and now: nothing to follow.
    let Ok(rect) = frame::visible_rect(hwnd) else {
        return;
    };
    coordinator.on_window_moved(hwnd.0 as usize, rect);
}
