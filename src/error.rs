use core::fmt;

use crate::dispatch::Route;

/// Errors reported to callers running in normal context.
///
/// Code running from a pin change or timer expiry never sees these; it drops
/// what it cannot deliver and counts it instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The menu level is not below the configured menu count
    MenuLevelOutOfRange { level: u8, count: u8 },
    /// A menu count of zero was requested
    InvalidMenuCount,
    /// The menu count can no longer change because a button exists
    MenuCountFrozen,
    /// The menu count is larger than the context was built to hold
    MenuCountTooLarge { count: u8, capacity: usize },
    /// The queue for this route had no room and the action was dropped
    QueueFull(Route),
    /// The debounce window is too short to fit the required polls
    InvalidDebounce,
    /// A long press, auto-repeat or double-click interval of zero
    InvalidInterval,
    /// The mode routes events to the async queue but nobody consumes it
    NoAsyncConsumer,
    /// The async queue already has its consumer
    ConsumerTaken,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MenuLevelOutOfRange { level, count } => {
                write!(f, "menu level {level} out of range for {count} menus")
            }
            Error::InvalidMenuCount => f.write_str("menu count must be at least one"),
            Error::MenuCountFrozen => {
                f.write_str("menu count is fixed once the first button is created")
            }
            Error::MenuCountTooLarge { count, capacity } => {
                write!(f, "{count} menus requested, room for {capacity}")
            }
            Error::QueueFull(route) => write!(f, "{route:?} event queue is full"),
            Error::InvalidDebounce => f.write_str("debounce window shorter than one poll per tick"),
            Error::InvalidInterval => f.write_str("button intervals must be longer than zero"),
            Error::NoAsyncConsumer => f.write_str("no consumer is servicing the async queue"),
            Error::ConsumerTaken => f.write_str("async queue consumer already taken"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_displayed_it_names_the_offending_level() {
        let error = Error::MenuLevelOutOfRange { level: 3, count: 2 };
        assert_eq!(error.to_string(), "menu level 3 out of range for 2 menus");
    }
}
