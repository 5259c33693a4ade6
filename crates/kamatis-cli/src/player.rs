//! Sound playback through an external player program.
//!
//! Decoding is left to the player (`paplay` unless `KAMATIS_PLAYER` names
//! another). A sound that is still playing is not restarted.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use kamatis_core::{SoundChoice, SoundPlayer};

const DEFAULT_PLAYER: &str = "paplay";

pub struct CommandPlayer {
    program: String,
    file: Option<PathBuf>,
    child: Option<Child>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            file: None,
            child: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("KAMATIS_PLAYER").unwrap_or_else(|_| DEFAULT_PLAYER.into()))
    }

    fn is_playing(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                if !status.success() {
                    tracing::warn!("{} exited with {status}", self.program);
                }
                self.child = None;
                false
            }
            Some(Err(err)) => {
                tracing::warn!("Cannot query {}: {err}", self.program);
                self.child = None;
                false
            }
            None => false,
        }
    }

    /// Play the loaded file and wait for the player to finish.
    pub fn play_blocking(&mut self) -> std::io::Result<bool> {
        let Some(file) = self.file.clone() else {
            return Ok(false);
        };
        let status = Command::new(&self.program)
            .arg(&file)
            .stdin(Stdio::null())
            .status()?;
        Ok(status.success())
    }
}

impl SoundPlayer for CommandPlayer {
    fn load(&mut self, choice: &SoundChoice) {
        self.file = choice.file().map(PathBuf::from);
        if let Some(file) = &self.file {
            if !file.is_file() {
                tracing::warn!("Sound file {} does not exist", file.display());
            }
        }
    }

    fn play(&mut self) {
        if self.is_playing() {
            return;
        }
        let Some(file) = &self.file else {
            return;
        };
        match Command::new(&self.program)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => self.child = Some(child),
            Err(err) => tracing::warn!("Cannot play {} with {}: {err}", file.display(), self.program),
        }
    }
}

impl Drop for CommandPlayer {
    /// Stops a sound that is still playing instead of waiting for it.
    fn drop(&mut self) {
        if !self.is_playing() {
            return;
        }
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill().and_then(|()| child.wait().map(|_| ())) {
                tracing::warn!("Cannot stop {}: {err}", self.program);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_choice_plays_nothing() {
        let mut player = CommandPlayer::new("definitely-not-a-player");
        player.load(&SoundChoice::NoSound);
        player.play();
        assert!(player.child.is_none());
        assert!(!player.play_blocking().unwrap());
    }

    #[test]
    fn missing_program_is_not_fatal() {
        let mut player = CommandPlayer::new("definitely-not-a-player");
        player.load(&SoundChoice::File("/tmp/bell.ogg".into()));
        player.play();
        assert!(player.child.is_none());
        assert!(player.play_blocking().is_err());
    }

    #[test]
    fn drop_stops_a_running_player() {
        let mut player = CommandPlayer::new("sleep");
        player.load(&SoundChoice::File("30".into()));
        player.play();
        assert!(player.child.is_some());

        let started = std::time::Instant::now();
        drop(player);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }
}
