use std::fs;
use std::path::PathBuf;

use crate::{Error, Result};

/// Returns the Lucent data directory, `%LOCALAPPDATA%\lucent`, creating it
/// if needed. Falls back to the platform data directory elsewhere.
fn data_dir() -> Result<PathBuf> {
    let base = std::env::var_os("LOCALAPPDATA")
        .map(PathBuf::from)
        .or_else(dirs::data_local_dir)
        .ok_or_else(|| Error::Ipc("no local data directory".into()))?;

    let dir = base.join("lucent");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Returns the path to the PID file.
pub fn pid_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("lucent.pid"))
}

/// Writes the current process's PID. Called when the daemon starts.
pub fn write_pid_file() -> Result<()> {
    fs::write(pid_path()?, std::process::id().to_string())?;
    Ok(())
}

/// Reads the daemon PID, if a PID file exists.
pub fn read_pid_file() -> Result<Option<u32>> {
    let path = pid_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path)?;
    let pid = contents
        .trim()
        .parse()
        .map_err(|e| Error::Ipc(format!("invalid PID file contents: {e}")))?;
    Ok(Some(pid))
}

/// Removes the PID file. Called when the daemon shuts down cleanly.
pub fn remove_pid_file() -> Result<()> {
    let path = pid_path()?;
    if path.exists() {
        fs::remove_file(&path)?;
    }
    Ok(())
}
