//! The interactive event loop.
//!
//! Hosts one scheduler on a single-threaded runtime. Stdin lines, timer
//! deadlines, and Ctrl-C are multiplexed; each action runs to completion
//! before the next is picked up. Only `quit` or Ctrl-C end the loop; a closed
//! stdin just stops command input.

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use kamatis_core::{
    format_remaining, Autostart, Config, Event, NoticeLevel, PeriodScheduler, SchedulerState,
    SystemClock, PERIOD_STEPS,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use crate::notifier::{Notifier, Output};
use crate::player::CommandPlayer;

type Scheduler = PeriodScheduler<Config, SystemClock>;

const HELP: &str = "\
commands:
  start    begin a work period
  pause    pause the current period
  resume   resume a paused period
  toggle   start, pause or resume depending on the state
  skip     end the current period now
  reset    stop the session
  status   show period and time left
  reload   re-read settings from disk
  quit     exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Toggle,
    Skip,
    Reset,
    Status,
    Reload,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "toggle" | "t" => Command::Toggle,
            "skip" => Command::Skip,
            "reset" | "stop" => Command::Reset,
            "status" | "s" => Command::Status,
            "reload" => Command::Reload,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command '{other}', try 'help'")),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Start a work period right away.
    pub start: bool,
    pub output: Output,
    /// Show desktop notifications.
    pub desktop: bool,
}

pub fn run(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(event_loop(options))
}

async fn event_loop(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let clock = SystemClock::new();
    let mut scheduler = PeriodScheduler::new(
        Config::load_or_default(),
        Box::new(CommandPlayer::from_env()),
        clock,
    );

    let notifier = Rc::new(RefCell::new(Notifier::new(options.output, options.desktop)));
    let sink = Rc::clone(&notifier);
    scheduler.subscribe(move |event| sink.borrow_mut().handle(event));

    sync_autostart(&mut scheduler);
    if options.start {
        execute(&mut scheduler, &notifier, Command::Start);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Launched from autostart there is no terminal; keep running without input.
    let mut stdin_open = true;
    loop {
        let deadline = scheduler
            .next_deadline()
            .map(|ms| Instant::from_std(clock.instant_at(ms)));

        tokio::select! {
            _ = sleep_until(deadline) => {
                scheduler.fire_due();
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    tracing::debug!("stdin closed, waiting for Ctrl-C");
                    stdin_open = false;
                    continue;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => execute(&mut scheduler, &notifier, command),
                    Err(err) => eprintln!("{err}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn execute(scheduler: &mut Scheduler, notifier: &RefCell<Notifier>, command: Command) {
    let result = match command {
        Command::Start => scheduler.start(),
        Command::Pause => scheduler.pause(),
        Command::Resume => scheduler.resume(),
        Command::Toggle => match scheduler.state() {
            SchedulerState::Stopped => scheduler.start(),
            SchedulerState::Running => scheduler.pause(),
            SchedulerState::Paused => scheduler.resume(),
        },
        Command::Skip => scheduler.skip(),
        Command::Reset => {
            refresh_settings(scheduler);
            scheduler.reset();
            sync_autostart(scheduler);
            Ok(())
        }
        Command::Status => {
            println!("{}", status_line(scheduler, &notifier.borrow()));
            Ok(())
        }
        Command::Reload => {
            refresh_settings(scheduler);
            scheduler.apply_settings();
            sync_autostart(scheduler);
            Ok(())
        }
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Quit => Ok(()),
    };
    if let Err(err) = result {
        eprintln!("error: {err}");
    }
}

/// Replace the in-memory settings with what is on disk.
fn refresh_settings(scheduler: &mut Scheduler) {
    match Config::load() {
        Ok(config) => *scheduler.settings_mut() = config,
        Err(err) => tracing::warn!("Keeping current settings: {err}"),
    }
}

fn sync_autostart(scheduler: &mut Scheduler) {
    let enabled = scheduler.settings().autostart;
    if let Err(err) = Autostart::user().apply(enabled) {
        tracing::warn!("{err}");
        let action = if enabled { "create" } else { "remove" };
        scheduler.events().emit(Event::notice(
            NoticeLevel::Warning,
            format!("Cannot {action} autostart file. See log for more info."),
        ));
    }
}

fn status_line(scheduler: &Scheduler, notifier: &Notifier) -> String {
    let Some(remaining) = scheduler.remaining_time() else {
        return SchedulerState::Stopped.to_string();
    };
    format!(
        "{} | {} | {} | step {}/{} | short breaks {}/{}",
        notifier.tooltip().replace('\n', ": "),
        scheduler.state(),
        format_remaining(remaining),
        notifier.progress_step() + 1,
        PERIOD_STEPS,
        scheduler.cycle_counter(),
        scheduler.cycle_length(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!("start".parse::<Command>(), Ok(Command::Start));
        assert_eq!("PAUSE".parse::<Command>(), Ok(Command::Pause));
        assert_eq!("t".parse::<Command>(), Ok(Command::Toggle));
        assert_eq!("stop".parse::<Command>(), Ok(Command::Reset));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
        assert!("snooze".parse::<Command>().is_err());
    }
}
