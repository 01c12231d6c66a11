//! The few OS calls the CLI needs, with a stub on non-Windows hosts so
//! the binary still builds and prints a clear message there.

use lucent_core::ipc::{Command, Response};

#[cfg(windows)]
mod imp {
    use std::os::windows::process::CommandExt;
    use std::process::{Command as Process, Stdio};

    use super::{Command, Response};

    /// `CREATE_NO_WINDOW | CREATE_NEW_PROCESS_GROUP`: the daemon gets no
    /// console and survives Ctrl+C in the launching terminal.
    const DETACH_FLAGS: u32 = 0x0800_0000 | 0x0000_0200;

    pub fn is_daemon_running() -> bool {
        lucent_windows::ipc::is_daemon_running()
    }

    pub fn send_command(command: &Command) -> lucent_core::Result<Response> {
        lucent_windows::ipc::send_command(command)
    }

    pub fn is_process_alive(pid: u32) -> bool {
        lucent_windows::process::is_process_alive(pid)
    }

    pub fn kill_process(pid: u32) -> bool {
        lucent_windows::process::kill_process(pid)
    }

    /// Re-launches this executable as a detached `lucent daemon`.
    pub fn spawn_daemon() -> std::io::Result<u32> {
        let exe = std::env::current_exe()?;
        let mut child = Process::new(exe)
            .arg("daemon")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .creation_flags(DETACH_FLAGS)
            .spawn()?;
        let pid = child.id();
        let _ = child.try_wait();
        Ok(pid)
    }

    pub fn run_daemon() -> lucent_core::Result<()> {
        lucent_windows::daemon::run()
    }
}

#[cfg(not(windows))]
mod imp {
    use lucent_core::Error;

    use super::{Command, Response};

    const UNSUPPORTED: &str = "Lucent only runs on Windows";

    pub fn is_daemon_running() -> bool {
        false
    }

    pub fn send_command(_command: &Command) -> lucent_core::Result<Response> {
        Err(Error::Ipc(UNSUPPORTED.into()))
    }

    pub fn is_process_alive(_pid: u32) -> bool {
        false
    }

    pub fn kill_process(_pid: u32) -> bool {
        false
    }

    pub fn spawn_daemon() -> std::io::Result<u32> {
        Err(std::io::Error::new(std::io::ErrorKind::Unsupported, UNSUPPORTED))
    }

    pub fn run_daemon() -> lucent_core::Result<()> {
        Err(Error::Ipc(UNSUPPORTED.into()))
    }
}

pub use imp::*;
