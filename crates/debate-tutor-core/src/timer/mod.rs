mod countdown;
mod walkthrough;

pub use countdown::{Countdown, TimerState};
pub use walkthrough::{Cursor, Walkthrough};
