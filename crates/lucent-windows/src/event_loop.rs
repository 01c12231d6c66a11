use std::cell::RefCell;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use lucent_core::LinkedDragCoordinator;
use lucent_core::config::WheelConfig;
use lucent_core::hotkey::{Chord, HotkeyCommand};
use lucent_core::{Error, Result};
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{PostThreadMessageW, WM_QUIT};

use crate::hotkey::HotkeyManager;

#[path = "event_loop_message_pump.rs"]
mod message_pump;
#[path = "event_loop_mouse_hook.rs"]
mod mouse_hook;
#[path = "event_loop_win_event.rs"]
mod win_event;

pub(crate) use mouse_hook::WheelEvent;

// Hook callbacks receive no user data, so their state lives in
// thread-locals on the hook thread.
thread_local! {
    static LINKED_DRAG: RefCell<Option<Arc<LinkedDragCoordinator>>> = const { RefCell::new(None) };
}

/// Everything the hook thread needs to start.
pub(crate) struct HookSetup {
    pub coordinator: Arc<LinkedDragCoordinator>,
    pub bindings: Vec<(Chord, HotkeyCommand)>,
    pub hotkey_tx: Sender<HotkeyCommand>,
    /// `None` leaves Ctrl+wheel opacity off.
    pub wheel: Option<(WheelConfig, Sender<WheelEvent>)>,
}

/// Starts the hook thread: location-change hook, low-level mouse hook
/// and global hotkeys, all served by one message pump.
///
/// A hook that cannot be installed is logged and its feature stays off;
/// only failing to start the thread itself is an error.
pub(crate) fn start(setup: HookSetup) -> Result<EventLoopHandle> {
    let (ready_tx, ready_rx) = mpsc::channel::<u32>();

    let handle = thread::Builder::new()
        .name("lucent-hooks".into())
        .spawn(move || run(setup, &ready_tx))?;

    let thread_id = ready_rx
        .recv()
        .map_err(|_| Error::Hook("event loop"))?;

    Ok(EventLoopHandle { thread_id, handle })
}

fn run(setup: HookSetup, ready: &Sender<u32>) {
    let HookSetup {
        coordinator,
        bindings,
        hotkey_tx,
        wheel,
    } = setup;

    // SAFETY: returns the id of the calling thread.
    let thread_id = unsafe { GetCurrentThreadId() };

    LINKED_DRAG.with(|cell| *cell.borrow_mut() = Some(coordinator));
    let move_hook = win_event::install();
    let mouse_hook = wheel.and_then(|(config, sender)| mouse_hook::install(&config, sender));

    let mut hotkeys = HotkeyManager::new(hotkey_tx);
    hotkeys.register_all(&bindings);

    // The queue exists now (hooks and hotkeys created it), so WM_QUIT
    // posted by `stop` cannot be lost.
    let _ = ready.send(thread_id);

    message_pump::run(&hotkeys);

    drop(hotkeys);
    if let Some(hook) = mouse_hook {
        mouse_hook::uninstall(hook);
    }
    if let Some(hook) = move_hook {
        win_event::uninstall(hook);
    }
    LINKED_DRAG.with(|cell| cell.borrow_mut().take());
}

/// Handle for stopping the hook thread from the daemon.
pub(crate) struct EventLoopHandle {
    thread_id: u32,
    handle: thread::JoinHandle<()>,
}

impl EventLoopHandle {
    /// Posts `WM_QUIT` to the pump and waits for the hooks to be removed.
    pub fn stop(self) {
        // SAFETY: posting to a thread id we own.
        unsafe {
            let _ = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
        }
        let _ = self.handle.join();
    }
}
