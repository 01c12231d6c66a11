use lucent_core::ipc::{Command, ResponseStatus};
use lucent_core::pid;

use super::platform;

pub fn execute() {
    if platform::is_daemon_running() {
        match platform::send_command(&Command::Status) {
            Ok(response) if response.status == ResponseStatus::Ok => {
                println!("Lucent is running.");
                if let Some(msg) = response.message {
                    println!("{msg}");
                }
            }
            _ => println!("Lucent is running."),
        }
        return;
    }

    if let Ok(Some(pid)) = pid::read_pid_file() {
        if platform::is_process_alive(pid) {
            println!("Lucent process exists (PID: {pid}) but is not responding.");
        } else {
            let _ = pid::remove_pid_file();
            println!("Lucent is not running (cleaned up stale PID file).");
        }
    } else {
        println!("Lucent is not running.");
    }
}
