//! A single debounced button and the actions bound to it.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embassy_time::{Duration, Instant};
use embedded_hal::digital::PinState;
use heapless::Vec;

use crate::classify::{Classifier, Emissions, Intervals, MAX_EMISSIONS_PER_STEP, check_interval};
use crate::context::ButtonContext;
use crate::debounce::{DebounceState, Debouncer, Transition};
use crate::dispatch::Dispatched;
use crate::error::Error;
use crate::event::{Event, EventMask};
use crate::log;
use crate::table::ActionTable;
use crate::timer::{TimerId, Timers};
use crate::{
    Action, DEFAULT_DEBOUNCE, DEFAULT_MENU_CAPACITY, MAX_DISAGREEING_POLLS,
    MAX_EMISSIONS_PER_SERVICE, TARGET_POLLS,
};

/// Timing and polarity of a button. [`Button::new`] rejects a zero interval or
/// a debounce window too short to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonConfig {
    /// Level the pin reads while the button is held
    pub pressed_level: PinState,
    /// Time a level must be stable before it counts
    pub debounce: Duration,
    pub intervals: Intervals,
}

impl ButtonConfig {
    /// Defaults: long press 750 ms, auto-repeat 250 ms, double-click 333 ms and
    /// debounce 8 ms
    pub fn new(pressed_level: PinState) -> Self {
        Self {
            pressed_level,
            debounce: DEFAULT_DEBOUNCE,
            intervals: Intervals::default(),
        }
    }

    pub fn with_long_press(mut self, interval: Duration) -> Self {
        self.intervals.long_press = interval;
        self
    }

    pub fn with_auto_repeat(mut self, interval: Duration) -> Self {
        self.intervals.auto_repeat = interval;
        self
    }

    pub fn with_double_click(mut self, interval: Duration) -> Self {
        self.intervals.double_click = interval;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

struct Inner<const MENUS: usize> {
    debouncer: Debouncer,
    classifier: Classifier,
    timers: Timers,
    table: ActionTable<MENUS>,
}

impl<const MENUS: usize> Inner<MENUS> {
    /// Handle one expired timer
    fn step(&mut self, id: TimerId, due: Instant, pressed: bool, menu_level: u8, out: &mut Emissions) {
        let mask = self.table.mask();
        match id {
            TimerId::Poll => {
                let transition = self.debouncer.poll(pressed);
                if !self.debouncer.is_confirming() {
                    self.timers.poll.cancel();
                }
                match transition {
                    Some(Transition::Down) => {
                        self.classifier.key_down(due, mask, &mut self.timers, out)
                    }
                    Some(Transition::Up) => {
                        self.classifier
                            .key_up(due, mask, menu_level, &mut self.timers, out)
                    }
                    None => {}
                }
                self.debouncer.settle();
            }
            TimerId::LongPress => {
                self.classifier
                    .long_press_expired(due, mask, &mut self.timers, out)
            }
            TimerId::DoubleClick => self.classifier.double_click_expired(mask, out),
        }
    }

    fn start_polling(&mut self, now: Instant, poll_interval: Duration) {
        if !self.timers.poll.is_pending() {
            self.timers.poll.start_periodic(now, poll_interval);
        }
    }
}

/// A push button.
///
/// All methods take `&self`; per-button state sits behind one critical section
/// so the interrupt-side entry points ([`on_pin_change`](Self::on_pin_change),
/// [`service`](Self::service)) and the configuration calls made from tasks can
/// interleave. Actions are never run from here, only queued on the context.
///
/// A platform drives the button like this, see
/// [`watch_button`](crate::tasks::button::watch_button):
/// - on a pin edge, call `on_pin_change`
/// - when `next_deadline` passes, read the pin and call `service`
/// - before waiting for the next edge, call `resync` with the current level
pub struct Button<'a, const MENUS: usize = DEFAULT_MENU_CAPACITY> {
    context: &'a ButtonContext<MENUS>,
    pressed_level: PinState,
    poll_interval: Duration,
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<MENUS>>>,
}

impl<'a, const MENUS: usize> Button<'a, MENUS> {
    /// Create a button. This fixes the menu count of `context`.
    pub fn new(context: &'a ButtonContext<MENUS>, config: ButtonConfig) -> Result<Self, Error> {
        let poll_interval = config.debounce / TARGET_POLLS as u32;
        if poll_interval.as_ticks() == 0 {
            return Err(Error::InvalidDebounce);
        }
        config.intervals.check()?;
        let menu_count = context.menu().freeze();
        let table = ActionTable::new(menu_count)?;
        log::info!(
            "BUTTON: active {}, polling every {} us, {} menus",
            if config.pressed_level == PinState::High { "high" } else { "low" },
            poll_interval.as_micros(),
            menu_count
        );
        Ok(Self {
            context,
            pressed_level: config.pressed_level,
            poll_interval,
            inner: Mutex::new(RefCell::new(Inner {
                debouncer: Debouncer::new(TARGET_POLLS, MAX_DISAGREEING_POLLS),
                classifier: Classifier::new(config.intervals),
                timers: Timers::idle(),
                table,
            })),
        })
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner<MENUS>) -> R) -> R {
        self.inner.lock(|inner| f(&mut inner.borrow_mut()))
    }

    pub fn pressed_level(&self) -> PinState {
        self.pressed_level
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn enable_event(&self, events: impl Into<EventMask>) {
        let events = events.into();
        self.with(|inner| inner.table.enable(events));
    }

    pub fn disable_event(&self, events: impl Into<EventMask>) {
        let events = events.into();
        self.with(|inner| inner.table.disable(events));
    }

    pub fn event_enabled(&self, event: Event) -> bool {
        self.with(|inner| inner.table.is_enabled(event))
    }

    /// Takes effect the next time the long press timer is armed
    pub fn set_long_press_interval(&self, interval: Duration) -> Result<(), Error> {
        let interval = check_interval(interval)?;
        self.with(|inner| inner.classifier.intervals.long_press = interval);
        Ok(())
    }

    pub fn long_press_interval(&self) -> Duration {
        self.with(|inner| inner.classifier.intervals.long_press)
    }

    /// Takes effect the next time auto-repeat starts
    pub fn set_auto_repeat_interval(&self, interval: Duration) -> Result<(), Error> {
        let interval = check_interval(interval)?;
        self.with(|inner| inner.classifier.intervals.auto_repeat = interval);
        Ok(())
    }

    pub fn auto_repeat_interval(&self) -> Duration {
        self.with(|inner| inner.classifier.intervals.auto_repeat)
    }

    /// Takes effect the next time a double-click window opens
    pub fn set_double_click_interval(&self, interval: Duration) -> Result<(), Error> {
        let interval = check_interval(interval)?;
        self.with(|inner| inner.classifier.intervals.double_click = interval);
        Ok(())
    }

    pub fn double_click_interval(&self) -> Duration {
        self.with(|inner| inner.classifier.intervals.double_click)
    }

    /// Bind `action` to `event` at `menu_level`. Binding a long press,
    /// auto-repeat or double-click action enables detecting that event.
    pub fn bind_at(&self, event: Event, menu_level: u8, action: Action) -> Result<(), Error> {
        self.with(|inner| inner.table.bind(event, menu_level, action))
    }

    /// Bind at the current menu level
    pub fn bind(&self, event: Event, action: Action) -> Result<(), Error> {
        self.bind_at(event, self.context.menu_level(), action)
    }

    pub fn unbind_at(&self, event: Event, menu_level: u8) -> Result<(), Error> {
        self.with(|inner| inner.table.unbind(event, menu_level))
    }

    /// Unbind at the current menu level
    pub fn unbind(&self, event: Event) -> Result<(), Error> {
        self.unbind_at(event, self.context.menu_level())
    }

    /// Queue the action bound to `event` at `menu_level` as if the event had
    /// just happened. `Ok(None)` when nothing is bound there.
    pub fn action_at(&self, event: Event, menu_level: u8) -> Result<Option<Dispatched>, Error> {
        let Some(action) = self.with(|inner| inner.table.resolve(event, menu_level))? else {
            return Ok(None);
        };
        self.context.dispatcher().dispatch(event, action).map(Some)
    }

    /// Queue the action bound to `event` at the current menu level
    pub fn action(&self, event: Event) -> Result<Option<Dispatched>, Error> {
        self.action_at(event, self.context.menu_level())
    }

    pub fn debounce_state(&self) -> DebounceState {
        self.with(|inner| inner.debouncer.state())
    }

    /// Debounced state of the contact
    pub fn is_pressed(&self) -> bool {
        self.with(|inner| inner.debouncer.is_pressed())
    }

    /// Whether the debounce poll timer is running. Pin edges can be ignored
    /// meanwhile.
    pub fn is_polling(&self) -> bool {
        self.with(|inner| inner.timers.poll.is_pending())
    }

    /// When [`service`](Self::service) must be called next
    pub fn next_deadline(&self) -> Option<Instant> {
        self.with(|inner| inner.timers.next().map(|(_, at)| at))
    }

    /// The pin changed level. Starts the debounce poll timer unless it already
    /// runs.
    pub fn on_pin_change(&self, now: Instant) {
        let poll_interval = self.poll_interval;
        self.with(|inner| inner.start_polling(now, poll_interval));
    }

    /// Restart polling if `level` contradicts the debounced state while nothing
    /// is polling. Closes the gap between the end of polling and re-arming the
    /// pin interrupt.
    pub fn resync(&self, now: Instant, level: PinState) {
        let pressed = level == self.pressed_level;
        let poll_interval = self.poll_interval;
        self.with(|inner| {
            if !inner.timers.poll.is_pending() && inner.debouncer.disagrees_with(pressed) {
                inner.start_polling(now, poll_interval);
            }
        });
    }

    /// Handle the timers due at `now`, `level` being the pin level sampled for
    /// this call. Poll ticks missed by a late call count as one sample. Resulting
    /// actions are queued on the context; a full queue drops them. Whatever
    /// does not fit in one call stays due for the next.
    pub fn service(&self, now: Instant, level: PinState) {
        let pressed = level == self.pressed_level;
        let mut ready: Vec<(Event, Action), MAX_EMISSIONS_PER_SERVICE> = Vec::new();

        self.with(|inner| {
            let menu_level = self.context.menu_level();
            let mut out = Emissions::new();
            // Steps may emit nothing, so they are bounded as well
            for _ in 0..MAX_EMISSIONS_PER_SERVICE {
                if out.capacity() - out.len() < MAX_EMISSIONS_PER_STEP {
                    break;
                }
                let Some(id) = inner.timers.next_expired(now) else {
                    break;
                };
                let deadline = inner.timers.get_mut(id);
                let fired = match id {
                    TimerId::Poll => deadline.fire_latest(now),
                    TimerId::LongPress | TimerId::DoubleClick => deadline.fire(now),
                };
                let Some(due) = fired else {
                    break;
                };
                inner.step(id, due, pressed, menu_level, &mut out);
            }

            for emission in out {
                let level = emission.menu_level.unwrap_or(menu_level);
                log::debug!("BUTTON: {} at menu level {}", emission.event, level);
                if let Some(action) = inner.table.lookup(emission.event, level) {
                    // Same capacity as `out`
                    let _ = ready.push((emission.event, action));
                }
            }

            if !inner.timers.poll.is_pending() && inner.debouncer.disagrees_with(pressed) {
                inner.start_polling(now, self.poll_interval);
            }
        });

        for (event, action) in ready {
            // Full queues are counted by the dispatcher, there is nobody to report to here
            let _ = self.context.dispatcher().dispatch(event, action);
        }
    }
}

impl<const MENUS: usize> Drop for Button<'_, MENUS> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().get_mut();
        inner.classifier.reset(&mut inner.timers);
        inner.timers.cancel_all();
    }
}
