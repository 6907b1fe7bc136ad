//! Deadline timers owned by a button. Dropping the button cancels them.

use embassy_time::{Duration, Instant};

/// A one-shot or periodic deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    at: Option<Instant>,
    period: Option<Duration>,
}

impl Deadline {
    pub const fn idle() -> Self {
        Self {
            at: None,
            period: None,
        }
    }

    /// Fire once, `after` from `now`. Replaces whatever was pending.
    pub fn start(&mut self, now: Instant, after: Duration) {
        self.at = Some(now + after);
        self.period = None;
    }

    /// Fire every `period`, the first time one period from `now`. A zero period
    /// is stretched to one tick so the deadline always moves forward.
    pub fn start_periodic(&mut self, now: Instant, period: Duration) {
        let period = period.max(Duration::from_ticks(1));
        self.at = Some(now + period);
        self.period = Some(period);
    }

    pub fn cancel(&mut self) {
        self.at = None;
        self.period = None;
    }

    pub fn is_pending(&self) -> bool {
        self.at.is_some()
    }

    pub fn is_periodic(&self) -> bool {
        self.period.is_some()
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.at
    }

    /// If the deadline has passed, consume one expiry and return the instant it
    /// was due. Periodic deadlines advance by exactly one period so that late
    /// servicing does not drift the cadence.
    pub fn fire(&mut self, now: Instant) -> Option<Instant> {
        let due = self.at.filter(|at| *at <= now)?;
        self.at = self.period.map(|period| due + period);
        Some(due)
    }

    /// Like [`fire`](Self::fire), but every period missed up to `now` counts as
    /// one expiry. Returns the latest instant that was due; the next one lies
    /// after `now`.
    pub fn fire_latest(&mut self, now: Instant) -> Option<Instant> {
        let due = self.at.filter(|at| *at <= now)?;
        let Some(period) = self.period else {
            self.at = None;
            return Some(due);
        };
        let missed = (now - due).as_ticks() / period.as_ticks();
        let latest = due + Duration::from_ticks(missed * period.as_ticks());
        self.at = Some(latest + period);
        Some(latest)
    }
}

/// Identifies one of the three timers of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerId {
    Poll,
    LongPress,
    DoubleClick,
}

/// The three independent timers of a button.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timers {
    /// Debounce sampling
    pub poll: Deadline,
    /// Long press threshold, then auto-repeat cadence
    pub long_press: Deadline,
    /// Window separating a double-click from a single press
    pub double_click: Deadline,
}

impl Timers {
    pub const fn idle() -> Self {
        Self {
            poll: Deadline::idle(),
            long_press: Deadline::idle(),
            double_click: Deadline::idle(),
        }
    }

    pub fn get_mut(&mut self, id: TimerId) -> &mut Deadline {
        match id {
            TimerId::Poll => &mut self.poll,
            TimerId::LongPress => &mut self.long_press,
            TimerId::DoubleClick => &mut self.double_click,
        }
    }

    /// Earliest pending deadline and the timer it belongs to. Ties go to the
    /// poll timer first, so a confirmed release is seen before a timer that
    /// would otherwise fire at the same instant.
    pub fn next(&self) -> Option<(TimerId, Instant)> {
        [
            (TimerId::Poll, self.poll.expires_at()),
            (TimerId::LongPress, self.long_press.expires_at()),
            (TimerId::DoubleClick, self.double_click.expires_at()),
        ]
        .into_iter()
        .filter_map(|(id, at)| at.map(|at| (id, at)))
        .min_by_key(|(_, at)| *at)
    }

    /// The earliest timer already due at `now`
    pub fn next_expired(&self, now: Instant) -> Option<TimerId> {
        self.next().filter(|(_, at)| *at <= now).map(|(id, _)| id)
    }

    pub fn cancel_all(&mut self) {
        self.poll.cancel();
        self.long_press.cancel();
        self.double_click.cancel();
    }
}
