use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use lucent_core::WindowRegistry;
use lucent_core::apply::BulkOpacity;
use lucent_core::window::WindowApi;

use super::daemon_ipc;
use super::daemon_types::DaemonMsg;

/// Forwards everything from a component channel into the daemon channel.
pub(super) fn spawn_bridge<T: Send + 'static>(
    name: &str,
    rx: mpsc::Receiver<T>,
    tx: mpsc::Sender<DaemonMsg>,
    wrap: fn(T) -> DaemonMsg,
) -> Option<thread::JoinHandle<()>> {
    spawn(name, move || {
        for item in rx {
            if tx.send(wrap(item)).is_err() {
                break;
            }
        }
    })
}

/// Spawns the IPC listener thread.
pub(super) fn spawn_ipc_listener(tx: mpsc::Sender<DaemonMsg>) -> Option<thread::JoinHandle<()>> {
    spawn("ipc", move || daemon_ipc::ipc_loop(tx))
}

/// Polls the OS window list every `interval` until `stop` is signalled
/// or dropped.
///
/// Only the OS query runs here; the snapshot is applied on the main
/// thread.
pub(super) fn spawn_poll_thread(
    api: Arc<dyn WindowApi>,
    interval: Duration,
    tx: mpsc::Sender<DaemonMsg>,
    stop: mpsc::Receiver<()>,
) -> Option<thread::JoinHandle<()>> {
    spawn("window-poll", move || {
        while let Err(RecvTimeoutError::Timeout) = stop.recv_timeout(interval) {
            let snapshot = WindowRegistry::poll(api.as_ref());
            if tx.send(DaemonMsg::Snapshot(snapshot)).is_err() {
                break;
            }
        }
    })
}

/// Runs a bulk opacity change off the main thread and reports back.
pub(super) fn spawn_bulk_opacity(
    api: Arc<dyn WindowApi>,
    bulk: BulkOpacity,
    tx: mpsc::Sender<DaemonMsg>,
) {
    let _ = spawn("bulk-opacity", move || {
        let done = bulk.run(api.as_ref());
        let _ = tx.send(DaemonMsg::BulkDone(done));
    });
}

fn spawn(name: &str, body: impl FnOnce() + Send + 'static) -> Option<thread::JoinHandle<()>> {
    match thread::Builder::new().name(name.into()).spawn(body) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::error!("Failed to start {name} thread: {e}");
            None
        }
    }
}
