mod clock;
mod engine;
mod schedule;
mod single_shot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{
    format_remaining, PeriodScheduler, SchedulerState, TimerSlot, PERIOD_STEPS, RESET_NOTICE,
    SKIP_NOTICE,
};
pub use schedule::{Cycle, Period};
pub use single_shot::SingleShot;
