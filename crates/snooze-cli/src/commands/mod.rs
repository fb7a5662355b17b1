//! Command implementations.

mod snooze;

pub use snooze::SnoozeCommand;
