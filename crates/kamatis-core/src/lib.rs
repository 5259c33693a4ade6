//! # Kamatis Core Library
//!
//! This library provides the core logic for the Kamatis Pomodoro timer.
//! Front ends (the terminal CLI today) construct a [`PeriodScheduler`],
//! subscribe to its events, and host the event loop that fires its timers.
//!
//! ## Architecture
//!
//! - **Period Scheduler**: a single-threaded state machine cycling through
//!   work, short break, and long break periods, with pause/resume and a
//!   twelve-step progress ticker per period
//! - **Events**: synchronous publish/subscribe of state, period, message, and
//!   progress changes
//! - **Storage**: TOML-based settings with key/value access
//! - **Sound & Autostart**: the sound choice seam and the XDG autostart entry
//!
//! ## Key Components
//!
//! - [`PeriodScheduler`]: Core scheduler state machine
//! - [`Config`]: Application settings management
//! - [`EventBus`]: Observer registry for scheduler events
//! - [`SoundPlayer`]: Trait for period-end sound playback

pub mod autostart;
pub mod error;
pub mod events;
pub mod sound;
pub mod storage;
pub mod timer;

pub use autostart::Autostart;
pub use error::{ConfigError, CoreError, SchedulerError};
pub use events::{Event, EventBus, NoticeLevel, SubscriptionId};
pub use sound::{NullPlayer, SoundChoice, SoundPlayer};
pub use storage::{Config, SettingsSource};
pub use timer::{
    format_remaining, Clock, ManualClock, Period, PeriodScheduler, SchedulerState, SystemClock,
    TimerSlot, PERIOD_STEPS,
};
