//! Sound choice and the playback seam.
//!
//! The `chosen_sound` setting holds either a file path or one of three
//! sentinels inherited from the sound picker entries. None of the sentinels
//! name anything playable.

use std::path::{Path, PathBuf};

pub const NO_SOUND: &str = "NO_SOUND";
pub const SEPARATOR: &str = "SEPARATOR";
pub const CHOOSE: &str = "CHOOSE";

/// File extensions offered when listing sounds.
pub const SOUND_EXTENSIONS: [&str; 5] = ["wav", "ogg", "oga", "mp3", "flac"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundChoice {
    NoSound,
    /// Picker separator; selecting it plays nothing.
    Separator,
    /// Picker entry that prompts for a file; plays nothing by itself.
    Choose,
    File(PathBuf),
}

impl SoundChoice {
    pub fn parse(value: &str) -> Self {
        match value {
            NO_SOUND | "" => SoundChoice::NoSound,
            SEPARATOR => SoundChoice::Separator,
            CHOOSE => SoundChoice::Choose,
            path => SoundChoice::File(PathBuf::from(path)),
        }
    }

    /// The file to play, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            SoundChoice::File(path) => Some(path),
            _ => None,
        }
    }
}

/// Plays the configured sound at the end of every period.
///
/// Implementations report their own failures (logging, notices) and never
/// propagate them to the scheduler.
pub trait SoundPlayer {
    fn load(&mut self, choice: &SoundChoice);
    fn play(&mut self);
}

/// Player that stays silent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlayer;

impl SoundPlayer for NullPlayer {
    fn load(&mut self, _choice: &SoundChoice) {}
    fn play(&mut self) {}
}

/// Audio files directly inside `dir`, sorted by path.
pub fn find_sounds(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut sounds: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_sound_file(path))
        .collect();
    sounds.sort();
    Ok(sounds)
}

fn is_sound_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SOUND_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_play_nothing() {
        for value in [NO_SOUND, SEPARATOR, CHOOSE, ""] {
            assert_eq!(SoundChoice::parse(value).file(), None, "{value}");
        }
        assert_eq!(SoundChoice::parse(SEPARATOR), SoundChoice::Separator);
        assert_eq!(SoundChoice::parse(CHOOSE), SoundChoice::Choose);
    }

    #[test]
    fn paths_are_files() {
        let choice = SoundChoice::parse("/usr/share/sounds/bell.oga");
        assert_eq!(choice.file(), Some(Path::new("/usr/share/sounds/bell.oga")));
    }

    #[test]
    fn find_sounds_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.ogg", "a.WAV", "notes.txt", "c.mp3"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.ogg")).unwrap();

        let found: Vec<_> = find_sounds(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["a.WAV", "b.ogg", "c.mp3"]);
    }
}
