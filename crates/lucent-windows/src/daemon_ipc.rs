use std::sync::mpsc;

use lucent_core::ipc::{Command, Response};

use crate::ipc::PipeServer;

use super::daemon_types::{DaemonMsg, ResponseSender};

/// Accepts IPC connections in a loop and forwards commands to the
/// main daemon thread. Returns after relaying `stop`.
pub(super) fn ipc_loop(tx: mpsc::Sender<DaemonMsg>) {
    loop {
        let server = match PipeServer::create() {
            Ok(s) => s,
            Err(e) => {
                log::error!("IPC listener stopped: {e}");
                return;
            }
        };

        let command = match server.accept_command() {
            Ok(cmd) => cmd,
            Err(e) => {
                log::warn!("Discarding malformed IPC request: {e}");
                let _ = server.send_response(&Response::error(e.to_string()));
                continue;
            }
        };
        log::debug!("IPC command: {command:?}");

        let (reply_tx, reply_rx): (ResponseSender, _) = mpsc::channel();
        let is_stop = matches!(command, Command::Stop);

        if tx.send(DaemonMsg::Command(command, reply_tx)).is_err() {
            return;
        }

        // A handler that panicked drops the sender without replying.
        let response = reply_rx
            .recv()
            .unwrap_or_else(|_| Response::error("command failed unexpectedly; see the log"));
        if let Err(e) = server.send_response(&response) {
            log::warn!("Failed to answer IPC client: {e}");
        }

        if is_stop {
            return;
        }
    }
}
