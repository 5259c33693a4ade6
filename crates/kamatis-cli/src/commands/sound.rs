use std::path::{Path, PathBuf};

use clap::Subcommand;
use kamatis_core::sound::{find_sounds, NO_SOUND};
use kamatis_core::{Config, SoundChoice, SoundPlayer};

use crate::player::CommandPlayer;

#[derive(Subcommand)]
pub enum SoundAction {
    /// List sound files in the search directory and recent choices
    List {
        /// Directory to search instead of the saved one
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Play a sound file at the end of each period
    Choose {
        /// Path to an audio file
        path: PathBuf,
    },
    /// Play no sound
    None,
    /// Play the chosen sound once
    Test,
}

pub fn run(action: SoundAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    match action {
        SoundAction::List { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.search_dir));
            let mark = |path: &str| if path == config.chosen_sound { "*" } else { " " };

            println!("{} No sounds", mark(NO_SOUND));
            for recent in &config.recent_sounds {
                println!("{} {recent}", mark(recent.as_str()));
            }
            match find_sounds(&dir) {
                Ok(sounds) => {
                    for sound in sounds {
                        let path = sound.to_string_lossy();
                        if !config.recent_sounds.iter().any(|r| *r == path) {
                            println!("{} {path}", mark(&*path));
                        }
                    }
                }
                Err(err) => eprintln!("cannot read {}: {err}", dir.display()),
            }
        }
        SoundAction::Choose { path } => {
            let path = absolute(&path)?;
            if !path.is_file() {
                return Err(format!("{} is not a file", path.display()).into());
            }
            config.choose_sound(&path);
            config.save()?;
            println!("ok");
        }
        SoundAction::None => {
            config.chosen_sound = NO_SOUND.into();
            config.save()?;
            println!("ok");
        }
        SoundAction::Test => {
            let choice = SoundChoice::parse(&config.chosen_sound);
            if choice.file().is_none() {
                println!("no sound chosen");
                return Ok(());
            }
            let mut player = CommandPlayer::from_env();
            player.load(&choice);
            if !player.play_blocking()? {
                return Err("The selected file cannot be played.".into());
            }
        }
    }
    Ok(())
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
