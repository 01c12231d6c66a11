use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use lucent_core::{Result, logging, pid};
use windows::Win32::UI::WindowsAndMessaging::{MB_ICONERROR, MB_OK, MessageBoxW};
use windows::core::{HSTRING, w};

use crate::dpi;

#[path = "daemon_ipc.rs"]
mod daemon_ipc;
#[path = "daemon_loop.rs"]
mod daemon_loop;
#[path = "daemon_loop_handlers.rs"]
mod daemon_loop_handlers;
#[path = "daemon_threads.rs"]
mod daemon_threads;
#[path = "daemon_types.rs"]
mod daemon_types;

/// Runs the Lucent daemon until a `stop` command arrives.
///
/// The main thread owns the session. Hooks and hotkeys run on their own
/// thread, as do the IPC listener, the window poll and bulk operations.
pub fn run() -> Result<()> {
    dpi::enable_dpi_awareness();
    install_panic_hook();
    pid::write_pid_file()?;

    let result = daemon_loop::daemon_loop();
    if let Err(e) = &result {
        log::error!("Daemon stopped with error: {e}");
    }

    let _ = pid::remove_pid_file();
    logging::flush();
    result
}

static PANIC_REPORTED: AtomicBool = AtomicBool::new(false);

/// Logs every panic and tells the user about the first one.
///
/// The message box is shown from its own thread so the panicking thread
/// can unwind into `catch_unwind` and the daemon keeps running.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        log::error!("Unexpected error: {info}");
        logging::flush();

        if PANIC_REPORTED.swap(true, Ordering::SeqCst) {
            return;
        }
        let text = HSTRING::from(format!(
            "Lucent hit an unexpected error and will try to keep running.\n\n{info}\n\nDetails are in the log file."
        ));
        let _ = thread::Builder::new()
            .name("panic-report".into())
            .spawn(move || {
                // SAFETY: ownerless message box with valid strings.
                unsafe {
                    let _ = MessageBoxW(None, &text, w!("Lucent"), MB_OK | MB_ICONERROR);
                }
            });
    }));
}
