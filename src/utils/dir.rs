use std::{env, io, path::PathBuf};

use anyhow::{anyhow, Result};

const APPLICATION_DIR: &str = "nudgeblock";

/// Resolves the data directory: `$XDG_STATE_HOME/nudgeblock`, then `$HOME/.local/state/nudgeblock`,
/// then `%APPDATA%\nudgeblock`. The directory is created if missing.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|home| PathBuf::from(home).join(".local/state")))
        .or_else(|_| env::var("APPDATA").map(PathBuf::from))
        .map_err(|_| anyhow!("Couldn't find XDG_STATE_HOME, HOME or APPDATA"))?;
    path.push(APPLICATION_DIR);
    ensure_dir(path)
}

pub fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
