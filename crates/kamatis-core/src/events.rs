use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::timer::{Period, SchedulerState};

/// Every observable change in the scheduler produces an Event.
/// The tray/terminal front end subscribes to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    StateChanged {
        state: SchedulerState,
        at: DateTime<Utc>,
    },
    PeriodChanged {
        period: Period,
        at: DateTime<Utc>,
    },
    /// Short status message ("Work started", "Short break paused").
    TimerUpdated {
        message: String,
        at: DateTime<Utc>,
    },
    /// One of the coarse progress steps within the current period.
    PeriodProgressed {
        step: u8,
        at: DateTime<Utc>,
    },
    /// User-visible notice that is not tied to a timer change.
    Notice {
        level: NoticeLevel,
        message: String,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

impl Event {
    pub fn state_changed(state: SchedulerState) -> Self {
        Event::StateChanged {
            state,
            at: Utc::now(),
        }
    }

    pub fn period_changed(period: Period) -> Self {
        Event::PeriodChanged {
            period,
            at: Utc::now(),
        }
    }

    pub fn timer_updated(message: impl Into<String>) -> Self {
        Event::TimerUpdated {
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn period_progressed(step: u8) -> Self {
        Event::PeriodProgressed {
            step,
            at: Utc::now(),
        }
    }

    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        Event::Notice {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&Event)>;

/// Synchronous publish/subscribe list.
///
/// Handlers run in subscription order on the emitting thread, each to
/// completion before the next.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _)| *sid != id);
        self.handlers.len() != before
    }

    pub fn emit(&mut self, event: Event) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
