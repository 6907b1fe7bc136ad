//! Interrupt driven push buttons with debouncing, gesture detection and
//! per-menu actions. Detection runs in interrupt-like context; the bound
//! actions are queued on a [`ButtonContext`] and run elsewhere.
#![cfg_attr(not(test), no_std)]

pub mod button;
pub mod classify;
pub mod context;
pub mod debounce;
pub mod dispatch;
pub mod drivers;
pub mod error;
pub mod event;
mod log;
pub mod menu;
pub mod table;
pub mod tasks;
pub mod timer;

pub use button::{Button, ButtonConfig};
pub use context::ButtonContext;
pub use debounce::DebounceState;
pub use dispatch::{AsyncConsumer, Dispatched, Mode, Route};
pub use error::Error;
pub use event::{Event, EventMask};

use embassy_time::Duration;

/// A user action. Actions carry no payload; which table cell was dispatched is
/// what identifies the event.
pub type Action = fn();

/// Depth of the queue serviced by the async consumer task. It is drained quickly
/// so it can be short
pub const ASYNC_EVENT_QUEUE_DEPTH: usize = 5;

/// Depth of the queue drained by the application loop. Its service rate is
/// limited by that loop, so actions may back up.
pub const SYNC_EVENT_QUEUE_DEPTH: usize = 10;

/// Number of agreeing polls required to confirm a transition
pub const TARGET_POLLS: u16 = 10;

/// Disagreeing samples tolerated within one confirmation before it is abandoned
pub const MAX_DISAGREEING_POLLS: u16 = 1;

/// Menu levels a [`ButtonContext`] has room for unless told otherwise
pub const DEFAULT_MENU_CAPACITY: usize = 8;

/// Upper bound on events emitted by a single call to [`Button::service`]
pub const MAX_EMISSIONS_PER_SERVICE: usize = 8;

pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(750);
pub const DEFAULT_AUTO_REPEAT: Duration = Duration::from_millis(250);
pub const DEFAULT_DOUBLE_CLICK: Duration = Duration::from_millis(333);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_micros(8000);
