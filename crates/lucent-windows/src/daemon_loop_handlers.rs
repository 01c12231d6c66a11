use std::sync::mpsc;

use lucent_core::ipc::Command;
use lucent_core::{LinkedDragCoordinator, Session};

use super::daemon_threads;
use super::daemon_types::{DaemonMsg, Flow};

pub(super) fn handle(
    msg: DaemonMsg,
    session: &mut Session,
    coordinator: &LinkedDragCoordinator,
    tx: &mpsc::Sender<DaemonMsg>,
) -> Flow {
    match msg {
        DaemonMsg::Command(command, reply_tx) => {
            let stop = matches!(command, Command::Stop);
            if stop {
                log::info!("Stop command received, shutting down");
            }
            let response = session.handle(command);
            let _ = reply_tx.send(response);
            // Any command may have changed group membership.
            coordinator.set_topology(session.link_topology());
            if stop {
                return Flow::Stop;
            }
        }
        DaemonMsg::Hotkey(command) => {
            log::debug!("Hotkey {}", command.action);
            if let Some(bulk) = session.handle_hotkey(command) {
                daemon_threads::spawn_bulk_opacity(session.api().clone(), bulk, tx.clone());
            }
        }
        DaemonMsg::Wheel(event) => session.handle_wheel(event.hwnd, event.delta),
        DaemonMsg::Snapshot(Ok(snapshot)) => {
            let summary = session.apply_snapshot(snapshot);
            if !summary.is_empty() {
                coordinator.set_topology(session.link_topology());
            }
        }
        DaemonMsg::Snapshot(Err(e)) => log::warn!("Window poll failed: {e}"),
        DaemonMsg::LinkedMoved(moved) => session.mirror_linked_move(moved),
        DaemonMsg::BulkDone(done) => session.finish_bulk_opacity(&done),
    }
    Flow::Continue
}
