use lucent_core::ipc::{Command, ResponseStatus};
use lucent_core::pid;

use super::platform;

pub fn execute() {
    // Graceful shutdown first: the daemon saves settings, presets and layouts.
    if platform::is_daemon_running() {
        match platform::send_command(&Command::Stop) {
            Ok(response) if response.status == ResponseStatus::Ok => {
                let _ = pid::remove_pid_file();
                println!("Lucent stopped.");
                return;
            }
            Ok(response) => {
                eprintln!(
                    "Error: {}",
                    response.message.unwrap_or("unknown error".into())
                );
                std::process::exit(1);
            }
            Err(e) => eprintln!("IPC failed: {e}"),
        }
    }

    // The pipe is gone but the process may still be alive.
    match pid::read_pid_file() {
        Ok(Some(pid)) if platform::is_process_alive(pid) => {
            if platform::kill_process(pid) {
                let _ = pid::remove_pid_file();
                println!("Lucent stopped (killed PID {pid}).");
            } else {
                eprintln!("Failed to kill process {pid}.");
                std::process::exit(1);
            }
        }
        _ => println!("Lucent is not running."),
    }
}
