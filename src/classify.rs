//! Derives presses, long presses, auto-repeat and double-clicks from confirmed
//! transitions and timer expiries.
//!
//! Rules:
//! - a long press always swallows the KeyPress of the same cycle
//! - a double-click replaces both KeyPress events of its two cycles
//! - auto-repeat is independent of both

use embassy_time::{Duration, Instant};
use heapless::Vec;

use crate::error::Error;
use crate::event::{Event, EventMask};
use crate::timer::Timers;
use crate::{
    DEFAULT_AUTO_REPEAT, DEFAULT_DOUBLE_CLICK, DEFAULT_LONG_PRESS, MAX_EMISSIONS_PER_SERVICE,
};

/// Most events a single classifier step can emit
pub const MAX_EMISSIONS_PER_STEP: usize = 3;

/// An event ready for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Emission {
    pub event: Event,
    /// Menu level captured earlier, `None` to use the level current at dispatch
    pub menu_level: Option<u8>,
}

pub type Emissions = Vec<Emission, MAX_EMISSIONS_PER_SERVICE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Intervals {
    pub long_press: Duration,
    pub auto_repeat: Duration,
    pub double_click: Duration,
}

impl Intervals {
    pub fn check(&self) -> Result<(), Error> {
        check_interval(self.long_press)?;
        check_interval(self.auto_repeat)?;
        check_interval(self.double_click)?;
        Ok(())
    }
}

/// A zero interval would keep its timer due forever
pub fn check_interval(interval: Duration) -> Result<Duration, Error> {
    if interval.as_ticks() == 0 {
        Err(Error::InvalidInterval)
    } else {
        Ok(interval)
    }
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            long_press: DEFAULT_LONG_PRESS,
            auto_repeat: DEFAULT_AUTO_REPEAT,
            double_click: DEFAULT_DOUBLE_CLICK,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Classifier {
    pub intervals: Intervals,
    suppress_key_press: bool,
    repeating: bool,
    double_click_pending: Option<u8>,
}

impl Classifier {
    pub fn new(intervals: Intervals) -> Self {
        Self {
            intervals,
            ..Self::default()
        }
    }

    /// Menu level captured by the first click of a possible double-click
    pub fn double_click_pending(&self) -> Option<u8> {
        self.double_click_pending
    }

    pub fn key_down(
        &mut self,
        now: Instant,
        mask: EventMask,
        timers: &mut Timers,
        out: &mut Emissions,
    ) {
        self.suppress_key_press = false;
        self.repeating = false;
        emit(out, mask, Event::KeyDown, None);
        if mask.contains(Event::LongKeyPress) || mask.contains(Event::AutoRepeatPress) {
            timers.long_press.start(now, self.intervals.long_press);
        }
    }

    pub fn key_up(
        &mut self,
        now: Instant,
        mask: EventMask,
        menu_level: u8,
        timers: &mut Timers,
        out: &mut Emissions,
    ) {
        timers.long_press.cancel();
        self.repeating = false;
        emit(out, mask, Event::KeyUp, None);

        if core::mem::take(&mut self.suppress_key_press) {
            return;
        }

        match self.double_click_pending.take() {
            Some(captured) => {
                timers.double_click.cancel();
                if mask.contains(Event::DoubleClick) {
                    emit(out, mask, Event::DoubleClick, Some(captured));
                } else {
                    // Double-click was switched off mid window, so both clicks count
                    emit(out, mask, Event::KeyPress, Some(captured));
                    emit(out, mask, Event::KeyPress, None);
                }
            }
            None if mask.contains(Event::DoubleClick) => {
                timers.double_click.start(now, self.intervals.double_click);
                self.double_click_pending = Some(menu_level);
            }
            None => emit(out, mask, Event::KeyPress, None),
        }
    }

    /// The long press timer expired at `due` while the button was held
    pub fn long_press_expired(
        &mut self,
        due: Instant,
        mask: EventMask,
        timers: &mut Timers,
        out: &mut Emissions,
    ) {
        if self.repeating {
            if mask.contains(Event::AutoRepeatPress) {
                emit(out, mask, Event::AutoRepeatPress, None);
            } else {
                timers.long_press.cancel();
                self.repeating = false;
            }
            return;
        }
        emit(out, mask, Event::LongKeyPress, None);
        self.suppress_key_press = true;
        if mask.contains(Event::AutoRepeatPress) {
            timers.long_press.start_periodic(due, self.intervals.auto_repeat);
            self.repeating = true;
        }
    }

    /// No second click arrived within the window
    pub fn double_click_expired(&mut self, mask: EventMask, out: &mut Emissions) {
        if let Some(captured) = self.double_click_pending.take() {
            emit(out, mask, Event::KeyPress, Some(captured));
        }
    }

    pub fn reset(&mut self, timers: &mut Timers) {
        timers.long_press.cancel();
        timers.double_click.cancel();
        self.suppress_key_press = false;
        self.repeating = false;
        self.double_click_pending = None;
    }
}

fn emit(out: &mut Emissions, mask: EventMask, event: Event, menu_level: Option<u8>) {
    if mask.contains(event) {
        // Callers keep MAX_EMISSIONS_PER_STEP free before each step
        let _ = out.push(Emission { event, menu_level });
    }
}
