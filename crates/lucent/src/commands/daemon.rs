use super::platform;

pub fn execute() {
    if let Err(e) = platform::run_daemon() {
        eprintln!("Daemon error: {e}");
        std::process::exit(1);
    }
}
