//! XDG autostart entry management.
//!
//! When the `autostart` setting is on, a desktop entry is written to
//! `~/.config/autostart/kamatis.desktop`; when it is off the entry is removed.

use indoc::formatdoc;
use std::path::PathBuf;

use crate::error::{CoreError, Result};
use crate::storage::ensure_dir;

pub const APPLICATION_NAME: &str = "Kamatis";

/// Desktop entry launching the application at login.
pub fn desktop_entry() -> String {
    let name = APPLICATION_NAME;
    let exec = name.to_lowercase();
    formatdoc! {"
        [Desktop Entry]
        Version=1.0
        Type=Application
        Name={name}
        GenericName={name}
        Comment=Launch {name}
        Icon={exec}
        Categories=Utility;
        Exec={exec} run
        Terminal=false
    "}
}

#[derive(Debug, Clone)]
pub struct Autostart {
    dir: PathBuf,
}

impl Autostart {
    /// Manage the entry in the user's `~/.config/autostart`.
    pub fn user() -> Self {
        let dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("autostart");
        Self::in_dir(dir)
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.desktop", APPLICATION_NAME.to_lowercase()))
    }

    /// Create or remove the entry to match `enabled`.
    pub fn apply(&self, enabled: bool) -> Result<()> {
        if enabled {
            self.create()
        } else {
            self.remove()
        }
    }

    fn create(&self) -> Result<()> {
        let path = self.file_path();
        if !ensure_dir(&self.dir) {
            return Err(CoreError::Autostart {
                action: "create",
                path,
                source: std::io::Error::other(format!(
                    "{} is not a usable directory",
                    self.dir.display()
                )),
            });
        }
        std::fs::write(&path, desktop_entry()).map_err(|source| {
            tracing::warn!("Cannot create autostart file: {source}");
            CoreError::Autostart {
                action: "create",
                path: path.clone(),
                source,
            }
        })?;
        tracing::debug!("Wrote autostart entry {}", path.display());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let path = self.file_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => {
                tracing::warn!("Cannot remove autostart file: {source}");
                Err(CoreError::Autostart {
                    action: "remove",
                    path,
                    source,
                })
            }
        }
    }
}
