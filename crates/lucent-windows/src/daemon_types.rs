use std::sync::mpsc;

use lucent_core::Result;
use lucent_core::apply::BulkOpacityDone;
use lucent_core::hotkey::HotkeyCommand;
use lucent_core::ipc::{Command, Response};
use lucent_core::linked_drag::LinkedMove;
use lucent_core::window::WindowRecord;

use crate::event_loop::WheelEvent;

/// Internal message type for the main daemon thread.
pub(super) enum DaemonMsg {
    /// A CLI command with a callback to send the response.
    Command(Command, ResponseSender),
    /// A global hotkey was pressed.
    Hotkey(HotkeyCommand),
    /// Ctrl + wheel over a window.
    Wheel(WheelEvent),
    /// A fresh window list from the poll thread.
    Snapshot(Result<Vec<WindowRecord>>),
    /// The linked-drag coordinator moved a peer.
    LinkedMoved(LinkedMove),
    /// A background bulk opacity run finished.
    BulkDone(BulkOpacityDone),
}

/// Sends a response back to the IPC thread for the connected client.
pub(super) type ResponseSender = mpsc::Sender<Response>;

/// What the main loop should do after handling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    Continue,
    Stop,
}
