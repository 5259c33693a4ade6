//! Terminal and desktop presentation of scheduler events.
//!
//! Stands in for the tray icon: keeps the period tooltip text, the progress
//! step, and shows timer messages and notices.

use kamatis_core::autostart::APPLICATION_NAME;
use kamatis_core::{Event, NoticeLevel, SchedulerState};
use notify_rust::Notification;

const PAUSED_SUFFIX: &str = " - paused";
const MESSAGE_TIMEOUT_MS: i32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

#[derive(Debug)]
pub struct Notifier {
    output: Output,
    desktop: bool,
    period_text: String,
    progress_step: u8,
}

impl Notifier {
    pub fn new(output: Output, desktop: bool) -> Self {
        Self {
            output,
            desktop,
            period_text: String::new(),
            progress_step: 0,
        }
    }

    pub fn handle(&mut self, event: &Event) {
        match event {
            Event::StateChanged { state, .. } => self.on_state_changed(*state),
            Event::PeriodChanged { period, .. } => self.period_text = period.title(),
            Event::TimerUpdated { message, .. } => {
                self.print_line(message);
                self.show_message(message, NoticeLevel::Info);
            }
            Event::PeriodProgressed { step, .. } => self.progress_step = *step,
            Event::Notice { level, message, .. } => {
                self.print_line(message);
                self.show_message(message, *level);
            }
        }
        if self.output == Output::Json {
            match serde_json::to_string(event) {
                Ok(json) => println!("{json}"),
                Err(err) => tracing::warn!("Cannot encode event: {err}"),
            }
        }
    }

    /// Tooltip text: application name, then period with a paused marker.
    pub fn tooltip(&self) -> String {
        format!("{APPLICATION_NAME}\n{}", self.period_text)
            .trim()
            .to_string()
    }

    #[cfg(test)]
    pub fn period_text(&self) -> &str {
        &self.period_text
    }

    pub fn progress_step(&self) -> u8 {
        self.progress_step
    }

    fn on_state_changed(&mut self, state: SchedulerState) {
        match state {
            SchedulerState::Stopped => {
                self.period_text.clear();
                self.progress_step = 0;
            }
            SchedulerState::Running => {
                self.period_text = self.period_text.replace(PAUSED_SUFFIX, "");
            }
            SchedulerState::Paused => self.period_text.push_str(PAUSED_SUFFIX),
        }
    }

    fn print_line(&self, message: &str) {
        if self.output == Output::Text {
            println!("{message}");
        }
    }

    fn show_message(&self, message: &str, level: NoticeLevel) {
        if !self.desktop {
            return;
        }
        let summary = match level {
            NoticeLevel::Info => APPLICATION_NAME.to_string(),
            NoticeLevel::Warning => format!("{APPLICATION_NAME} warning"),
        };
        if let Err(err) = Notification::new()
            .appname(APPLICATION_NAME)
            .summary(&summary)
            .body(message)
            .timeout(MESSAGE_TIMEOUT_MS)
            .show()
        {
            tracing::warn!("Cannot show desktop notification: {err}");
        }
    }
}
