//! Logical button events and the per-button enable mask.

use core::ops::BitOr;

/// Logical events a button can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Event {
    /// Debounced press of the contact
    KeyDown = 0,
    /// Debounced release of the contact
    KeyUp,
    /// A completed click that was neither a long press nor part of a double-click
    KeyPress,
    /// The button was held past the long press interval
    LongKeyPress,
    /// Fired periodically while held after a long press
    AutoRepeatPress,
    /// Two clicks within the double-click window
    DoubleClick,
}

impl Event {
    /// Number of real event kinds
    pub const COUNT: usize = 6;

    pub const ALL: [Event; Event::COUNT] = [
        Event::KeyDown,
        Event::KeyUp,
        Event::KeyPress,
        Event::LongKeyPress,
        Event::AutoRepeatPress,
        Event::DoubleClick,
    ];

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Set of enabled events, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventMask(u16);

impl EventMask {
    pub const NONE: EventMask = EventMask(0);

    /// Every real event kind. Use it to enable or disable everything at once.
    pub const ALL: EventMask = EventMask((1 << Event::COUNT) - 1);

    /// Down, up and press are on out of the box. The rest switch on when an
    /// action is bound to them.
    pub const DEFAULT: EventMask =
        EventMask(Event::KeyDown.bit() | Event::KeyUp.bit() | Event::KeyPress.bit());

    pub const fn contains(self, event: Event) -> bool {
        self.0 & event.bit() != 0
    }

    pub fn insert(&mut self, other: impl Into<EventMask>) {
        self.0 |= other.into().0;
    }

    pub fn remove(&mut self, other: impl Into<EventMask>) {
        self.0 &= !other.into().0;
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Event> for EventMask {
    fn from(event: Event) -> Self {
        EventMask(event.bit())
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

impl BitOr<Event> for Event {
    type Output = EventMask;

    fn bitor(self, rhs: Event) -> EventMask {
        EventMask(self.bit() | rhs.bit())
    }
}
