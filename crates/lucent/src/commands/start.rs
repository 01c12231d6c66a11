use lucent_core::pid;

use super::platform;

pub fn execute() {
    if platform::is_daemon_running() {
        println!("Lucent is already running.");
        return;
    }

    // Clean up a stale PID file from a previous unclean shutdown.
    if let Ok(Some(pid)) = pid::read_pid_file() {
        if platform::is_process_alive(pid) {
            println!("Lucent process exists (PID: {pid}) but is not responding.");
            return;
        }
        let _ = pid::remove_pid_file();
    }

    match platform::spawn_daemon() {
        Ok(pid) => {
            println!("Lucent started (PID: {pid}).");
            println!("Settings: ~/.config/lucent/settings.toml");
            println!("Run 'lucent list' to see tracked windows.");
        }
        Err(e) => {
            eprintln!("Failed to start daemon: {e}");
            std::process::exit(1);
        }
    }
}
