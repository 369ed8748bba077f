use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

const DATA_DIR_NAME: &str = "galley";

/// Resolve the workbench data directory:
/// `GALLEY_DATA_DIR`, then `$XDG_DATA_HOME/galley`, then
/// `$HOME/.local/share/galley`.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = env::var("GALLEY_DATA_DIR") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    if let Ok(dir) = env::var("XDG_DATA_HOME") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir).join(DATA_DIR_NAME));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR_NAME),
    )
}

pub fn ensure_data_dir() -> Result<PathBuf> {
    let dir = data_dir().ok_or_else(|| {
        Error::storage("Could not resolve data directory (HOME is not set)".to_string())
    })?;
    fs::create_dir_all(&dir)
        .map_err(|e| Error::storage(format!("Failed to create data directory: {}", e)))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test touching GALLEY_DATA_DIR, so parallel test threads
    // cannot observe a partial set/remove.
    #[test]
    fn test_env_override_wins() {
        env::set_var("GALLEY_DATA_DIR", "/tmp/galley-data-override");
        assert_eq!(data_dir(), Some(PathBuf::from("/tmp/galley-data-override")));
        env::remove_var("GALLEY_DATA_DIR");
    }
}
