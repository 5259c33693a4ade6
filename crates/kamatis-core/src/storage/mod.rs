mod config;

pub use config::{Config, SettingsSource, MAX_RECENT_SOUNDS};

use std::path::{Path, PathBuf};

/// Returns `~/.config/kamatis[-dev]/` based on KAMATIS_ENV.
///
/// Set KAMATIS_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("KAMATIS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("kamatis-dev")
    } else {
        base_dir.join("kamatis")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Create `path` and its parents, reporting whether a directory now exists.
///
/// An existing directory counts as success. An existing non-directory or a
/// creation failure is logged and reported as `false`.
pub fn ensure_dir(path: &Path) -> bool {
    match std::fs::create_dir_all(path) {
        Ok(()) => true,
        Err(err) => {
            if path.exists() && !path.is_dir() {
                tracing::warn!("{} already exists and is not a dir.", path.display());
            } else {
                tracing::warn!("Cannot create {}: {err}", path.display());
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let parent = tempfile::tempdir().unwrap();
        let path = parent.path().join("a").join("testdir");
        assert!(ensure_dir(&path));
        assert!(path.is_dir());
    }

    #[test]
    fn ensure_dir_accepts_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_dir(dir.path()));
    }

    #[test]
    fn ensure_dir_rejects_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(!ensure_dir(file.path()));
    }

    #[test]
    fn ensure_dir_fails_below_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(!ensure_dir(&file.path().join("testdir")));
    }
}
