//! One-request-per-connection IPC over a Named Pipe.
//!
//! Each side writes a single line of JSON: the CLI sends a [`Command`],
//! the daemon answers with a [`Response`].

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::os::windows::io::FromRawHandle;

use lucent_core::ipc::{Command, PIPE_NAME, Response};
use lucent_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use windows::Win32::Foundation::{
    CloseHandle, DUPLICATE_SAME_ACCESS, DuplicateHandle, HANDLE, INVALID_HANDLE_VALUE,
};
use windows::Win32::Storage::FileSystem::{
    CreateFileW, FILE_SHARE_NONE, FlushFileBuffers, OPEN_EXISTING, PIPE_ACCESS_DUPLEX,
};
use windows::Win32::System::Pipes::{
    ConnectNamedPipe, CreateNamedPipeW, DisconnectNamedPipe, PIPE_READMODE_BYTE, PIPE_TYPE_BYTE,
    PIPE_UNLIMITED_INSTANCES, PIPE_WAIT, WaitNamedPipeW,
};
use windows::Win32::System::Threading::GetCurrentProcess;
use windows::core::HSTRING;

const GENERIC_READ_WRITE: u32 = 0x8000_0000 | 0x4000_0000;

/// Window lists can be large; responses use a generous buffer.
const PIPE_BUFFER_SIZE: u32 = 64 * 1024;

/// Owns a kernel handle and closes it on drop.
struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // SAFETY: the handle is owned exclusively by this guard.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// Server end of the daemon pipe, serving one client at a time.
pub struct PipeServer {
    pipe: OwnedHandle,
}

impl PipeServer {
    /// Creates a pipe instance. Does not wait for a client yet.
    pub fn create() -> Result<Self> {
        let name = HSTRING::from(PIPE_NAME);
        // SAFETY: all parameters are valid; failure is INVALID_HANDLE_VALUE.
        let handle = unsafe {
            CreateNamedPipeW(
                &name,
                PIPE_ACCESS_DUPLEX,
                PIPE_TYPE_BYTE | PIPE_READMODE_BYTE | PIPE_WAIT,
                PIPE_UNLIMITED_INSTANCES,
                PIPE_BUFFER_SIZE,
                PIPE_BUFFER_SIZE,
                0,
                None,
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            return Err(Error::Ipc(format!("cannot create pipe {PIPE_NAME}")));
        }
        Ok(Self {
            pipe: OwnedHandle(handle),
        })
    }

    /// Blocks until a client connects and returns its command.
    pub fn accept_command(&self) -> Result<Command> {
        // SAFETY: blocks on our own pipe handle until a client connects.
        unsafe { ConnectNamedPipe(self.pipe.0, None) }
            .map_err(|e| Error::os("ConnectNamedPipe", e))?;
        read_line(self.pipe.0)
    }

    /// Answers the connected client and disconnects it.
    pub fn send_response(&self, response: &Response) -> Result<()> {
        write_line(self.pipe.0, response)?;
        // SAFETY: waits for the client to drain the pipe; disconnecting
        // earlier would discard unread data (client sees error 233).
        unsafe {
            let _ = FlushFileBuffers(self.pipe.0);
            DisconnectNamedPipe(self.pipe.0).map_err(|e| Error::os("DisconnectNamedPipe", e))
        }
    }
}

/// Sends one command to the daemon and waits for its response.
pub fn send_command(command: &Command) -> Result<Response> {
    let name = HSTRING::from(PIPE_NAME);
    // SAFETY: opens the existing pipe as a client; the guard closes it.
    let handle = unsafe {
        CreateFileW(
            &name,
            GENERIC_READ_WRITE,
            FILE_SHARE_NONE,
            None,
            OPEN_EXISTING,
            Default::default(),
            None,
        )
    }
    .map_err(|e| Error::Ipc(format!("cannot connect to daemon: {e}")))?;
    let pipe = OwnedHandle(handle);

    write_line(pipe.0, command)?;
    read_line(pipe.0)
}

/// Whether a daemon pipe instance exists, without consuming a connection.
pub fn is_daemon_running() -> bool {
    let name = HSTRING::from(PIPE_NAME);
    // SAFETY: only probes for the pipe with a 1 ms timeout.
    unsafe { WaitNamedPipeW(&name, 1).as_bool() }
}

fn read_line<T: DeserializeOwned>(pipe: HANDLE) -> Result<T> {
    let mut reader = BufReader::new(pipe_file(pipe)?);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if line.trim().is_empty() {
        return Err(Error::Ipc("connection closed without a message".into()));
    }
    Ok(serde_json::from_str(line.trim())?)
}

fn write_line<T: Serialize>(pipe: HANDLE, message: &T) -> Result<()> {
    let mut writer = pipe_file(pipe)?;
    let json = serde_json::to_string(message)?;
    writeln!(writer, "{json}")?;
    writer.flush()?;
    Ok(())
}

/// Wraps a duplicate of the pipe handle as a `File`, so the `File` can
/// close its copy without invalidating ours.
fn pipe_file(handle: HANDLE) -> Result<File> {
    let mut dup = HANDLE::default();
    // SAFETY: the duplicate is owned by the returned File.
    unsafe {
        DuplicateHandle(
            GetCurrentProcess(),
            handle,
            GetCurrentProcess(),
            &mut dup,
            0,
            false,
            DUPLICATE_SAME_ACCESS,
        )
        .map_err(|e| Error::os("DuplicateHandle", e))?;
        Ok(File::from_raw_handle(dup.0))
    }
}
