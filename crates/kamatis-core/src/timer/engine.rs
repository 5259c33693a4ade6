//! Period scheduler implementation.
//!
//! The scheduler is a single-threaded state machine that owns two
//! single-shot timers: the period countdown and the progress ticker. It never
//! sleeps. The host event loop waits until [`PeriodScheduler::next_deadline`]
//! and then calls [`PeriodScheduler::fire_due`].
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -start-> Running -pause-> Paused -resume-> Running
//! Running|Paused -skip-> Running
//! any -reset-> Stopped
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut scheduler = PeriodScheduler::new(config, Box::new(NullPlayer), SystemClock::new());
//! scheduler.subscribe(|event| println!("{event:?}"));
//! scheduler.start()?;
//! // In the event loop, once the next deadline has passed:
//! scheduler.fire_due();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::clock::{Clock, ManualClock, SystemClock};
use super::schedule::{Cycle, Period};
use super::single_shot::SingleShot;
use crate::error::SchedulerError;
use crate::events::{Event, EventBus, NoticeLevel, SubscriptionId};
use crate::sound::{SoundChoice, SoundPlayer};
use crate::storage::SettingsSource;

/// Number of coarse progress steps per period.
pub const PERIOD_STEPS: u8 = 12;

const MS_PER_MINUTE: u64 = 60_000;
const DEFAULT_CYCLE: u32 = 4;

pub const RESET_NOTICE: &str = "Current session stopped. Will reset on restart.";
pub const SKIP_NOTICE: &str = "Skipping to the next period.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SchedulerState::Stopped => "stopped",
            SchedulerState::Running => "running",
            SchedulerState::Paused => "paused",
        })
    }
}

/// The two timers a scheduler can have pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerSlot {
    Period,
    Progress,
}

/// Time left on both timers when paused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Captured {
    remaining_ms: u64,
    progress_remaining_ms: u64,
}

/// Pomodoro period scheduler.
///
/// Reads period lengths from the settings source each time a period begins,
/// plays the configured sound at every period end, and reports every change
/// through its [`EventBus`].
pub struct PeriodScheduler<S, C = SystemClock> {
    settings: S,
    clock: C,
    player: Box<dyn SoundPlayer>,
    events: EventBus,
    state: SchedulerState,
    period: Option<Period>,
    cycle: Cycle,
    /// Length of the active period in milliseconds.
    timer_length_ms: u64,
    /// Current progress step; -1 until the first tick of a session.
    progress: i8,
    period_timer: SingleShot,
    progress_timer: SingleShot,
    /// Only set while paused.
    captured: Option<Captured>,
}

impl<S: SettingsSource, C: Clock> PeriodScheduler<S, C> {
    /// Create a stopped scheduler with the current settings applied.
    pub fn new(settings: S, player: Box<dyn SoundPlayer>, clock: C) -> Self {
        let mut scheduler = Self {
            settings,
            clock,
            player,
            events: EventBus::new(),
            state: SchedulerState::Stopped,
            period: None,
            cycle: Cycle::new(DEFAULT_CYCLE),
            timer_length_ms: 0,
            progress: -1,
            period_timer: SingleShot::new(),
            progress_timer: SingleShot::new(),
            captured: None,
        };
        scheduler.init_state();
        scheduler
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// The active period, `None` until the first start after a reset.
    pub fn period(&self) -> Option<Period> {
        self.period
    }

    pub fn cycle_counter(&self) -> u32 {
        self.cycle.counter()
    }

    pub fn cycle_length(&self) -> u32 {
        self.cycle.length
    }

    pub fn timer_length_ms(&self) -> u64 {
        self.timer_length_ms
    }

    /// Delay between progress ticks (truncating division).
    pub fn progress_interval_ms(&self) -> u64 {
        self.timer_length_ms / u64::from(PERIOD_STEPS)
    }

    /// Current progress step, -1 before the first tick.
    pub fn progress_step(&self) -> i8 {
        self.progress
    }

    /// Time left in the active period.
    ///
    /// While paused this is the value captured at pause time. `None` when
    /// stopped.
    pub fn remaining_time(&self) -> Option<u64> {
        match self.state {
            SchedulerState::Stopped => None,
            SchedulerState::Paused => self.captured.map(|c| c.remaining_ms),
            SchedulerState::Running => self.period_timer.remaining_ms(self.clock.now_ms()),
        }
    }

    /// Earliest pending timer deadline in clock milliseconds.
    pub fn next_deadline(&self) -> Option<u64> {
        [
            self.period_timer.deadline_ms(),
            self.progress_timer.deadline_ms(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Mutable access to the settings source.
    ///
    /// Edits take effect for cycle length and sound only after
    /// [`apply_settings`](Self::apply_settings); period lengths are read when
    /// each period begins.
    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        self.events.subscribe(handler)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session with a work period.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        self.require(SchedulerState::Stopped, "start")?;
        self.set_state(SchedulerState::Running);
        self.set_period(Period::Work);
        Ok(())
    }

    /// Stop both timers, keeping the time they had left.
    pub fn pause(&mut self) -> Result<(), SchedulerError> {
        self.require(SchedulerState::Running, "pause")?;
        let now = self.clock.now_ms();
        let captured = Captured {
            remaining_ms: self.period_timer.remaining_ms(now).unwrap_or(0),
            progress_remaining_ms: self.progress_timer.remaining_ms(now).unwrap_or(0),
        };
        self.period_timer.stop();
        self.progress_timer.stop();
        self.captured = Some(captured);
        tracing::debug!(
            remaining_ms = captured.remaining_ms,
            progress_remaining_ms = captured.progress_remaining_ms,
            "Paused"
        );
        self.set_state(SchedulerState::Paused);
        self.emit_timer_message("paused");
        Ok(())
    }

    /// Restart both timers from the times captured at pause.
    pub fn resume(&mut self) -> Result<(), SchedulerError> {
        self.require(SchedulerState::Paused, "resume")?;
        let captured = self.captured.take().unwrap_or_default();
        let now = self.clock.now_ms();
        self.period_timer.set_interval(captured.remaining_ms);
        self.period_timer.start(now);
        self.progress_timer
            .set_interval(captured.progress_remaining_ms);
        self.progress_timer.start(now);
        self.set_state(SchedulerState::Running);
        self.emit_timer_message("resumed");
        Ok(())
    }

    /// Stop everything and return to the startup baseline.
    ///
    /// Settings are re-applied, so edits take effect with the next start.
    pub fn reset(&mut self) {
        self.period_timer.stop();
        self.progress_timer.stop();
        self.init_state();
        self.events
            .emit(Event::notice(NoticeLevel::Info, RESET_NOTICE));
    }

    /// End the active period now.
    ///
    /// Both timers are armed with zero delay; the next [`fire_due`]
    /// performs a single period advancement and the progress restarts at
    /// step 0. A paused scheduler is set running.
    ///
    /// [`fire_due`]: Self::fire_due
    pub fn skip(&mut self) -> Result<(), SchedulerError> {
        if self.state == SchedulerState::Stopped {
            return Err(self.invalid("skip"));
        }
        let now = self.clock.now_ms();
        self.period_timer.set_interval(0);
        self.progress_timer.set_interval(0);
        self.period_timer.start(now);
        self.progress_timer.start(now);
        self.captured = None;
        if self.state == SchedulerState::Paused {
            self.set_state(SchedulerState::Running);
        }
        self.progress = -1;
        self.events.emit(Event::notice(NoticeLevel::Info, SKIP_NOTICE));
        Ok(())
    }

    /// Re-read cycle length and sound choice without touching the state.
    pub fn apply_settings(&mut self) {
        self.cycle.length = self
            .settings
            .get_u64("cycle")
            .and_then(|c| u32::try_from(c).ok())
            .unwrap_or_else(|| {
                tracing::warn!("No usable cycle length in settings, using {DEFAULT_CYCLE}");
                DEFAULT_CYCLE
            });
        let choice = SoundChoice::parse(&self.settings.get("chosen_sound").unwrap_or_default());
        self.player.load(&choice);
        tracing::debug!(cycle = self.cycle.length, sound = ?choice, "Settings applied");
    }

    // ── Timer dispatch ───────────────────────────────────────────────

    /// Fire the earliest expired timer, if any.
    ///
    /// The period timer wins ties so that a period change supersedes the
    /// progress tick falling on the same instant.
    pub fn fire_next(&mut self) -> Option<TimerSlot> {
        let slot = self.due_slot(self.clock.now_ms(), None)?;
        self.fire(slot);
        Some(slot)
    }

    /// Fire every timer that is due, each at most once, in deadline order.
    pub fn fire_due(&mut self) -> usize {
        let mut fired = Vec::with_capacity(2);
        while let Some(slot) = self.due_slot(self.clock.now_ms(), fired.first().copied()) {
            self.fire(slot);
            fired.push(slot);
            if fired.len() == 2 {
                break;
            }
        }
        fired.len()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn due_slot(&self, now: u64, exclude: Option<TimerSlot>) -> Option<TimerSlot> {
        let due = |slot: TimerSlot, timer: &SingleShot| {
            timer
                .deadline_ms()
                .filter(|d| *d <= now && exclude != Some(slot))
        };
        let period = due(TimerSlot::Period, &self.period_timer);
        let progress = due(TimerSlot::Progress, &self.progress_timer);
        match (period, progress) {
            (Some(p), Some(q)) if q < p => Some(TimerSlot::Progress),
            (Some(_), _) => Some(TimerSlot::Period),
            (None, Some(_)) => Some(TimerSlot::Progress),
            (None, None) => None,
        }
    }

    fn fire(&mut self, slot: TimerSlot) {
        let now = self.clock.now_ms();
        match slot {
            TimerSlot::Period => {
                if self.period_timer.take_if_due(now) {
                    self.on_period_timeout();
                }
            }
            TimerSlot::Progress => {
                if self.progress_timer.take_if_due(now) {
                    self.advance_progress();
                }
            }
        }
    }

    fn on_period_timeout(&mut self) {
        if self.state != SchedulerState::Running {
            return;
        }
        let next = match self.period {
            Some(previous) => self.cycle.next_after(previous),
            None => Period::Work,
        };
        self.set_period(next);
        self.player.play();
    }

    fn init_state(&mut self) {
        self.apply_settings();
        self.period = None;
        self.cycle.reset();
        self.progress = -1;
        self.timer_length_ms = 0;
        self.captured = None;
        self.set_state(SchedulerState::Stopped);
    }

    fn set_state(&mut self, state: SchedulerState) {
        tracing::debug!(from = %self.state, to = %state, "State changed");
        self.state = state;
        self.events.emit(Event::state_changed(state));
    }

    fn set_period(&mut self, period: Period) {
        self.period = Some(period);
        self.timer_length_ms = self.period_length_ms(period);
        tracing::info!(
            period = %period,
            length_ms = self.timer_length_ms,
            cycle_counter = self.cycle.counter(),
            "Period started"
        );
        self.events.emit(Event::period_changed(period));

        self.period_timer.set_interval(self.timer_length_ms);
        self.period_timer.start(self.clock.now_ms());
        self.emit_timer_message("started");

        self.progress = -1;
        self.advance_progress();
    }

    /// Self-rearming progress tick.
    fn advance_progress(&mut self) {
        self.progress = (self.progress + 1) % PERIOD_STEPS as i8;
        self.events
            .emit(Event::period_progressed(self.progress as u8));
        self.progress_timer
            .set_interval(self.progress_interval_ms());
        self.progress_timer.start(self.clock.now_ms());
    }

    fn period_length_ms(&self, period: Period) -> u64 {
        let key = period.settings_key();
        let minutes = self.settings.get_u64(&key).unwrap_or_else(|| {
            let fallback = period.default_minutes();
            tracing::warn!("No usable value for '{key}' in settings, using {fallback}");
            fallback
        });
        minutes.saturating_mul(MS_PER_MINUTE)
    }

    fn emit_timer_message(&mut self, what: &str) {
        let title = self.period.map(Period::title).unwrap_or_default();
        self.events
            .emit(Event::timer_updated(format!("{title} {what}")));
    }

    fn require(&self, state: SchedulerState, action: &'static str) -> Result<(), SchedulerError> {
        if self.state == state {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> SchedulerError {
        tracing::debug!("Rejected {action} while {}", self.state);
        SchedulerError::InvalidTransition {
            from: self.state,
            action,
        }
    }
}

impl<S: SettingsSource> PeriodScheduler<S, ManualClock> {
    /// Move the manual clock forward by `ms`, firing each expiry at its own
    /// deadline on the way.
    pub fn advance_clock(&mut self, ms: u64) {
        let target = self.clock.now_ms().saturating_add(ms);
        while let Some(deadline) = self.next_deadline().filter(|d| *d <= target) {
            self.clock.set(deadline.max(self.clock.now_ms()));
            if self.fire_next().is_none() {
                break;
            }
        }
        self.clock.set(target);
    }
}

impl<S, C> fmt::Debug for PeriodScheduler<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodScheduler")
            .field("state", &self.state)
            .field("period", &self.period)
            .field("cycle", &self.cycle)
            .field("timer_length_ms", &self.timer_length_ms)
            .field("progress", &self.progress)
            .field("period_timer", &self.period_timer)
            .field("progress_timer", &self.progress_timer)
            .field("events", &self.events)
            .finish()
    }
}

/// Render milliseconds as `MM:SS to go`, with an `HH:` prefix past an hour.
pub fn format_remaining(ms: u64) -> String {
    let secs = ms / 1000;
    let (mins, secs) = (secs / 60, secs % 60);
    let (hours, mins) = (mins / 60, mins % 60);
    if hours > 0 {
        format!("{hours:02}:{mins:02}:{secs:02} to go")
    } else {
        format!("{mins:02}:{secs:02} to go")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::NullPlayer;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    fn settings(work: u64, short: u64, long: u64, cycle: u64) -> HashMap<String, String> {
        [
            ("work", work),
            ("short_break", short),
            ("long_break", long),
            ("cycle", cycle),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn scheduler() -> PeriodScheduler<HashMap<String, String>, ManualClock> {
        PeriodScheduler::new(settings(25, 5, 15, 4), Box::new(NullPlayer), ManualClock::new())
    }

    fn recorded(
        s: &mut PeriodScheduler<HashMap<String, String>, ManualClock>,
    ) -> Rc<RefCell<Vec<Event>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        s.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        log
    }

    #[test]
    fn new_scheduler_is_at_baseline() {
        let s = scheduler();
        assert_eq!(s.state(), SchedulerState::Stopped);
        assert_eq!(s.cycle_counter(), 0);
        assert_eq!(s.progress_step(), -1);
        assert_eq!(s.cycle_length(), 4);
        assert_eq!(s.remaining_time(), None);
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn start_pause_resume() {
        let mut s = scheduler();
        s.start().unwrap();
        assert_eq!(s.state(), SchedulerState::Running);
        assert_eq!(s.period(), Some(Period::Work));
        assert_eq!(s.timer_length_ms(), 1_500_000);

        s.pause().unwrap();
        assert_eq!(s.state(), SchedulerState::Paused);
        assert_eq!(s.next_deadline(), None);

        s.resume().unwrap();
        assert_eq!(s.state(), SchedulerState::Running);
    }

    #[test]
    fn invalid_transitions_are_rejected_without_effect() {
        let mut s = scheduler();
        assert!(s.pause().is_err());
        assert!(s.resume().is_err());
        assert!(s.skip().is_err());
        assert_eq!(s.state(), SchedulerState::Stopped);

        s.start().unwrap();
        let err = s.start().unwrap_err();
        assert_eq!(
            err,
            SchedulerError::InvalidTransition {
                from: SchedulerState::Running,
                action: "start"
            }
        );
        assert!(s.resume().is_err());
        assert_eq!(s.state(), SchedulerState::Running);
    }

    #[test]
    fn start_emits_state_period_message_and_first_step() {
        let mut s = scheduler();
        let log = recorded(&mut s);
        s.start().unwrap();

        let log = log.borrow();
        assert!(matches!(log[0], Event::StateChanged { state: SchedulerState::Running, .. }));
        assert!(matches!(log[1], Event::PeriodChanged { period: Period::Work, .. }));
        assert!(matches!(&log[2], Event::TimerUpdated { message, .. } if message == "Work started"));
        assert!(matches!(log[3], Event::PeriodProgressed { step: 0, .. }));
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn pause_keeps_remaining_time() {
        let mut s = scheduler();
        s.start().unwrap();
        s.advance_clock(100_000);
        s.pause().unwrap();
        assert_eq!(s.remaining_time(), Some(1_400_000));

        // Time passing while paused changes nothing.
        s.advance_clock(10_000_000);
        assert_eq!(s.remaining_time(), Some(1_400_000));
        assert_eq!(s.period(), Some(Period::Work));

        s.resume().unwrap();
        s.advance_clock(1_399_999);
        assert_eq!(s.period(), Some(Period::Work));
        s.advance_clock(1);
        assert_eq!(s.period(), Some(Period::ShortBreak));
    }

    #[test]
    fn pause_keeps_time_to_next_progress_step() {
        let mut s = scheduler();
        s.start().unwrap();
        s.advance_clock(130_000);
        assert_eq!(s.progress_step(), 1);
        s.pause().unwrap();

        s.advance_clock(1_000_000);
        s.resume().unwrap();
        assert_eq!(s.next_deadline(), Some(1_130_000 + 120_000));

        s.advance_clock(119_999);
        assert_eq!(s.progress_step(), 1);
        s.advance_clock(1);
        assert_eq!(s.progress_step(), 2);
        assert_eq!(s.remaining_time(), Some(1_500_000 - 250_000));
    }

    #[test]
    fn pause_and_resume_messages_name_the_period() {
        let mut s = scheduler();
        s.start().unwrap();
        s.advance_clock(1_500_000);
        let log = recorded(&mut s);
        s.pause().unwrap();
        s.resume().unwrap();
        let messages: Vec<_> = log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::TimerUpdated { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(messages, vec!["Short break paused", "Short break resumed"]);
    }

    #[test]
    fn progress_ticks_twelve_times_per_period() {
        let mut s = scheduler();
        let log = recorded(&mut s);
        s.start().unwrap();
        s.advance_clock(1_500_000 - 1);
        let steps: Vec<u8> = log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::PeriodProgressed { step, .. } => Some(*step),
                _ => None,
            })
            .collect();
        assert_eq!(steps, (0..12).collect::<Vec<u8>>());
        assert_eq!(s.progress_interval_ms(), 125_000);
    }

    #[test]
    fn skip_while_paused_runs_and_advances_once() {
        let mut s = scheduler();
        s.start().unwrap();
        s.advance_clock(60_000);
        s.pause().unwrap();
        let log = recorded(&mut s);

        s.skip().unwrap();
        assert_eq!(s.state(), SchedulerState::Running);
        assert_eq!(s.remaining_time(), Some(0));
        assert_eq!(s.fire_due(), 1);

        assert_eq!(s.period(), Some(Period::ShortBreak));
        assert_eq!(s.progress_step(), 0);
        let log = log.borrow();
        let changes = log
            .iter()
            .filter(|e| matches!(e, Event::PeriodChanged { .. }))
            .count();
        assert_eq!(changes, 1);
        assert!(log
            .iter()
            .any(|e| matches!(e, Event::Notice { message, .. } if message == SKIP_NOTICE)));
        assert_eq!(s.remaining_time(), Some(300_000));
    }

    #[test]
    fn reset_returns_to_baseline_and_reapplies_settings() {
        let mut s = scheduler();
        s.start().unwrap();
        s.advance_clock(1_500_000);
        assert_eq!(s.cycle_counter(), 1);
        s.settings_mut().insert("cycle".into(), "2".into());
        assert_eq!(s.cycle_length(), 4);

        let log = recorded(&mut s);
        s.reset();
        assert_eq!(s.state(), SchedulerState::Stopped);
        assert_eq!(s.cycle_counter(), 0);
        assert_eq!(s.progress_step(), -1);
        assert_eq!(s.cycle_length(), 2);
        assert_eq!(s.next_deadline(), None);
        assert!(log
            .borrow()
            .iter()
            .any(|e| matches!(e, Event::Notice { message, .. } if message == RESET_NOTICE)));
    }

    #[test]
    fn period_length_is_read_when_period_begins() {
        let mut s = scheduler();
        s.start().unwrap();
        s.settings_mut().insert("short_break".into(), "1".into());
        s.advance_clock(1_500_000);
        assert_eq!(s.period(), Some(Period::ShortBreak));
        assert_eq!(s.timer_length_ms(), 60_000);
    }

    #[test]
    fn missing_settings_fall_back_to_defaults() {
        let mut s = PeriodScheduler::new(
            HashMap::<String, String>::new(),
            Box::new(NullPlayer),
            ManualClock::new(),
        );
        assert_eq!(s.cycle_length(), 4);
        s.start().unwrap();
        assert_eq!(s.timer_length_ms(), 25 * 60_000);
    }

    #[test]
    fn format_remaining_matches_tray_text() {
        assert_eq!(format_remaining(1_500_000), "25:00 to go");
        assert_eq!(format_remaining(61_999), "01:01 to go");
        assert_eq!(format_remaining(0), "00:00 to go");
        assert_eq!(format_remaining(3_723_000), "01:02:03 to go");
    }
}
