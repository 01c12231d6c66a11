use lucent_core::ipc::{Command, Response, ResponseStatus};
use serde::de::DeserializeOwned;

use super::platform;

/// Sends a command to the running daemon and prints its message.
pub fn execute(command: Command) {
    let response = request(&command);
    if let Some(msg) = response.message {
        println!("{msg}");
    }
}

/// Sends a command and returns the successful response.
///
/// Exits with status 1 if the daemon is not running, unreachable, or
/// reports an error.
pub fn request(command: &Command) -> Response {
    if !platform::is_daemon_running() {
        eprintln!("Lucent is not running. Start it with 'lucent start'.");
        std::process::exit(1);
    }

    match platform::send_command(command) {
        Ok(response) if response.status == ResponseStatus::Ok => response,
        Ok(response) => {
            eprintln!(
                "Error: {}",
                response.message.unwrap_or("unknown error".into())
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to reach the daemon: {e}");
            std::process::exit(1);
        }
    }
}

/// Sends a listing command and decodes its data payload.
pub fn fetch<T: DeserializeOwned>(command: &Command) -> T {
    let data = request(command)
        .data
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
    match serde_json::from_value(data) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Unexpected reply from the daemon: {e}");
            std::process::exit(1);
        }
    }
}
