//! Debouncing state machine. A change is confirmed after [`TARGET_POLLS`]
//! agreeing samples; one disagreeing sample is tolerated, more abandon it.
//!
//! [`TARGET_POLLS`]: crate::TARGET_POLLS

use crate::log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceState {
    Released,
    ConfirmingPress,
    /// Press confirmed, KeyDown is being handled
    Pressing,
    Pressed,
    WaitingForRelease,
    /// Release confirmed, KeyUp is being handled
    Releasing,
}

/// A confirmed change of the contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debouncer {
    state: DebounceState,
    valid_polls: u16,
    total_polls: u16,
    target_polls: u16,
    max_disagreeing: u16,
}

impl Debouncer {
    pub const fn new(target_polls: u16, max_disagreeing: u16) -> Self {
        Self {
            state: DebounceState::Released,
            valid_polls: 0,
            total_polls: 0,
            target_polls,
            max_disagreeing,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Whether a confirmation is in progress and the poll timer must keep running
    pub fn is_confirming(&self) -> bool {
        matches!(
            self.state,
            DebounceState::ConfirmingPress | DebounceState::WaitingForRelease
        )
    }

    /// Settled or transient state seen from the outside as pressed
    pub fn is_pressed(&self) -> bool {
        matches!(
            self.state,
            DebounceState::Pressing | DebounceState::Pressed | DebounceState::WaitingForRelease
        )
    }

    /// Whether a sample would start a confirmation if it arrived now
    pub fn disagrees_with(&self, pressed: bool) -> bool {
        match self.state {
            DebounceState::Released | DebounceState::Releasing => pressed,
            DebounceState::Pressed | DebounceState::Pressing => !pressed,
            DebounceState::ConfirmingPress | DebounceState::WaitingForRelease => false,
        }
    }

    /// Feed one sample, `pressed` being the raw level compared with the pressed
    /// polarity. Returns a transition once it is confirmed. The debouncer then
    /// stays in `Pressing`/`Releasing` until [`settle`](Self::settle).
    pub fn poll(&mut self, pressed: bool) -> Option<Transition> {
        self.settle();
        match self.state {
            DebounceState::Released if pressed => {
                self.begin(DebounceState::ConfirmingPress);
                self.check(DebounceState::Pressing, DebounceState::Released, Transition::Down)
            }
            DebounceState::Pressed if !pressed => {
                self.begin(DebounceState::WaitingForRelease);
                self.check(DebounceState::Releasing, DebounceState::Pressed, Transition::Up)
            }
            DebounceState::ConfirmingPress => {
                self.count(pressed);
                self.check(DebounceState::Pressing, DebounceState::Released, Transition::Down)
            }
            DebounceState::WaitingForRelease => {
                self.count(!pressed);
                self.check(DebounceState::Releasing, DebounceState::Pressed, Transition::Up)
            }
            _ => None,
        }
    }

    /// Finish handling a confirmed transition
    pub fn settle(&mut self) {
        self.state = match self.state {
            DebounceState::Pressing => DebounceState::Pressed,
            DebounceState::Releasing => DebounceState::Released,
            other => other,
        };
    }

    fn begin(&mut self, confirming: DebounceState) {
        self.state = confirming;
        self.valid_polls = 1;
        self.total_polls = 1;
    }

    fn count(&mut self, agrees: bool) {
        self.total_polls = self.total_polls.saturating_add(1);
        if agrees {
            self.valid_polls = self.valid_polls.saturating_add(1);
        }
    }

    fn check(
        &mut self,
        confirmed: DebounceState,
        fallback: DebounceState,
        transition: Transition,
    ) -> Option<Transition> {
        if self.total_polls - self.valid_polls > self.max_disagreeing {
            log::debug!(
                "Debounce: {} rejected after {} of {} polls",
                transition, self.valid_polls, self.total_polls
            );
            self.state = fallback;
            return None;
        }
        if self.valid_polls < self.target_polls {
            return None;
        }
        log::debug!("Debounce: {} confirmed after {} polls", transition, self.total_polls);
        self.state = confirmed;
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_DISAGREEING_POLLS, TARGET_POLLS};

    fn debouncer() -> Debouncer {
        Debouncer::new(TARGET_POLLS, MAX_DISAGREEING_POLLS)
    }

    fn feed(debouncer: &mut Debouncer, samples: &[bool]) -> Option<(usize, Transition)> {
        for (i, sample) in samples.iter().enumerate() {
            if let Some(transition) = debouncer.poll(*sample) {
                return Some((i + 1, transition));
            }
        }
        None
    }

    #[test]
    fn when_press_is_clean_it_confirms_after_target_polls() {
        let mut debouncer = debouncer();
        let result = feed(&mut debouncer, &[true; 20]);
        assert_eq!(result, Some((TARGET_POLLS as usize, Transition::Down)));
        assert_eq!(debouncer.state(), DebounceState::Pressing);
        debouncer.settle();
        assert_eq!(debouncer.state(), DebounceState::Pressed);
    }

    #[test]
    fn when_still_confirming_it_emits_nothing() {
        let mut debouncer = debouncer();
        assert_eq!(feed(&mut debouncer, &[true; 9]), None);
        assert_eq!(debouncer.state(), DebounceState::ConfirmingPress);
        assert!(debouncer.is_confirming());
    }

    #[test]
    fn when_one_sample_disagrees_confirmation_takes_one_more_poll() {
        let mut debouncer = debouncer();
        let mut samples = [true; 20];
        samples[4] = false;
        let result = feed(&mut debouncer, &samples);
        assert_eq!(result, Some((TARGET_POLLS as usize + 1, Transition::Down)));
    }

    #[test]
    fn when_disagreement_persists_confirmation_is_abandoned() {
        let mut debouncer = debouncer();
        let samples = [true, true, true, false, false];
        assert_eq!(feed(&mut debouncer, &samples), None);
        assert_eq!(debouncer.state(), DebounceState::Released);
        assert!(!debouncer.is_confirming());
    }

    #[test]
    fn when_two_isolated_samples_disagree_confirmation_is_abandoned() {
        let mut debouncer = debouncer();
        let samples = [true, false, true, true, false];
        assert_eq!(feed(&mut debouncer, &samples), None);
        assert_eq!(debouncer.state(), DebounceState::Released);
        // A fresh confirmation starts from scratch
        assert_eq!(feed(&mut debouncer, &[true; 9]), None);
        assert_eq!(debouncer.poll(true), Some(Transition::Down));
    }

    #[test]
    fn when_released_after_press_it_confirms_up() {
        let mut debouncer = debouncer();
        feed(&mut debouncer, &[true; 10]);
        let result = feed(&mut debouncer, &[false; 10]);
        assert_eq!(result, Some((10, Transition::Up)));
        debouncer.settle();
        assert_eq!(debouncer.state(), DebounceState::Released);
    }

    #[test]
    fn when_release_glitches_the_press_stands() {
        let mut debouncer = debouncer();
        feed(&mut debouncer, &[true; 10]);
        assert_eq!(feed(&mut debouncer, &[false, false, true, true]), None);
        assert_eq!(debouncer.state(), DebounceState::Pressed);
    }

    #[test]
    fn when_settled_samples_agree_nothing_happens() {
        let mut debouncer = debouncer();
        assert_eq!(feed(&mut debouncer, &[false; 5]), None);
        assert_eq!(debouncer.state(), DebounceState::Released);
        assert!(!debouncer.disagrees_with(false));
        assert!(debouncer.disagrees_with(true));
    }
}
