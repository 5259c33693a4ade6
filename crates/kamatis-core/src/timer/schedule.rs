use serde::{Deserialize, Serialize};
use std::fmt;

/// One phase of the Pomodoro cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Work,
    ShortBreak,
    LongBreak,
}

impl Period {
    /// Human-readable name, as shown in the tray tooltip.
    pub fn name(self) -> &'static str {
        match self {
            Period::Work => "work",
            Period::ShortBreak => "short break",
            Period::LongBreak => "long break",
        }
    }

    /// Settings key holding this period's length in minutes.
    ///
    /// Derived from the name with spaces replaced by underscores.
    pub fn settings_key(self) -> String {
        self.name().replace(' ', "_")
    }

    /// Name with the first letter upper-cased ("Short break").
    pub fn title(self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Period::Work)
    }

    /// Length used when the settings store has no usable value.
    pub fn default_minutes(self) -> u64 {
        match self {
            Period::Work => 25,
            Period::ShortBreak => 5,
            Period::LongBreak => 15,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counts short breaks taken since the last long break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cycle {
    /// Short breaks allowed before a long break is inserted.
    pub length: u32,
    counter: u32,
}

impl Cycle {
    pub fn new(length: u32) -> Self {
        Self { length, counter: 0 }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Period that follows `previous`, updating the counter.
    ///
    /// After work the counter is compared with the cycle length: below it a
    /// short break is taken and counted, otherwise the counter restarts and a
    /// long break follows. Every break is followed by work.
    pub fn next_after(&mut self, previous: Period) -> Period {
        if previous.is_break() {
            return Period::Work;
        }
        if self.counter < self.length {
            self.counter += 1;
            Period::ShortBreak
        } else {
            self.counter = 0;
            Period::LongBreak
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_keys_replace_spaces() {
        assert_eq!(Period::Work.settings_key(), "work");
        assert_eq!(Period::ShortBreak.settings_key(), "short_break");
        assert_eq!(Period::LongBreak.settings_key(), "long_break");
    }

    #[test]
    fn titles_are_capitalized() {
        assert_eq!(Period::Work.title(), "Work");
        assert_eq!(Period::ShortBreak.title(), "Short break");
        assert_eq!(Period::LongBreak.title(), "Long break");
    }

    #[test]
    fn cycle_of_four_inserts_long_break_on_fifth_break() {
        let mut cycle = Cycle::new(4);
        let mut period = Period::Work;
        let mut seen = vec![period];
        for _ in 0..9 {
            period = cycle.next_after(period);
            seen.push(period);
        }
        use Period::*;
        assert_eq!(
            seen,
            vec![
                Work, ShortBreak, Work, ShortBreak, Work, ShortBreak, Work, ShortBreak, Work,
                LongBreak
            ]
        );
        assert_eq!(cycle.counter(), 0);
    }

    #[test]
    fn break_always_returns_to_work() {
        let mut cycle = Cycle::new(2);
        assert_eq!(cycle.next_after(Period::ShortBreak), Period::Work);
        assert_eq!(cycle.next_after(Period::LongBreak), Period::Work);
        assert_eq!(cycle.counter(), 0);
    }
}
