//! Menu level shared by every button of a context.

use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

use crate::error::Error;
use crate::log;

#[derive(Debug, Clone, Copy)]
struct MenuState {
    count: u8,
    level: u8,
    frozen: bool,
}

/// Current menu level and the number of levels.
///
/// The count may change only until the first button is created, since every
/// button sizes its action table from it. The level changes at any time and is
/// read under a critical section from both contexts.
pub struct Menu {
    state: Mutex<CriticalSectionRawMutex, Cell<MenuState>>,
    capacity: usize,
}

impl Menu {
    /// One menu at level 0, with room for up to `capacity` menus
    pub const fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(Cell::new(MenuState {
                count: 1,
                level: 0,
                frozen: false,
            })),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> u8 {
        self.state.lock(|s| s.get().count)
    }

    pub fn level(&self) -> u8 {
        self.state.lock(|s| s.get().level)
    }

    pub fn is_frozen(&self) -> bool {
        self.state.lock(|s| s.get().frozen)
    }

    pub fn set_count(&self, count: u8) -> Result<(), Error> {
        if count == 0 {
            return Err(Error::InvalidMenuCount);
        }
        if usize::from(count) > self.capacity {
            return Err(Error::MenuCountTooLarge {
                count,
                capacity: self.capacity,
            });
        }
        self.state.lock(|s| {
            let mut state = s.get();
            if state.frozen {
                return Err(Error::MenuCountFrozen);
            }
            state.count = count;
            state.level = state.level.min(count - 1);
            s.set(state);
            Ok(())
        })?;
        log::info!("MENU: {} menus", count);
        Ok(())
    }

    pub fn set_level(&self, level: u8) -> Result<(), Error> {
        self.state.lock(|s| {
            let mut state = s.get();
            if level >= state.count {
                return Err(Error::MenuLevelOutOfRange {
                    level,
                    count: state.count,
                });
            }
            state.level = level;
            s.set(state);
            Ok(())
        })?;
        log::info!("MENU: level {}", level);
        Ok(())
    }

    /// Fix the count for good and return it
    pub fn freeze(&self) -> u8 {
        self.state.lock(|s| {
            let mut state = s.get();
            state.frozen = true;
            s.set(state);
            state.count
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_created_there_is_one_menu_at_level_zero() {
        let menu = Menu::new(8);
        assert_eq!(menu.count(), 1);
        assert_eq!(menu.level(), 0);
    }

    #[test]
    fn when_frozen_count_changes_are_rejected() {
        let menu = Menu::new(8);
        menu.set_count(4).unwrap();
        assert_eq!(menu.freeze(), 4);
        assert_eq!(menu.set_count(2), Err(Error::MenuCountFrozen));
        assert_eq!(menu.count(), 4);
        menu.set_level(3).unwrap();
        assert_eq!(menu.level(), 3);
    }

    #[test]
    fn when_level_is_out_of_range_it_is_rejected() {
        let menu = Menu::new(8);
        menu.set_count(2).unwrap();
        assert_eq!(
            menu.set_level(2),
            Err(Error::MenuLevelOutOfRange { level: 2, count: 2 })
        );
        assert_eq!(menu.level(), 0);
    }

    #[test]
    fn when_count_exceeds_the_capacity_it_is_rejected() {
        let menu = Menu::new(4);
        assert_eq!(
            menu.set_count(5),
            Err(Error::MenuCountTooLarge {
                count: 5,
                capacity: 4
            })
        );
        menu.set_count(4).unwrap();
        assert_eq!(menu.count(), 4);
    }

    #[test]
    fn when_count_shrinks_the_level_follows() {
        let menu = Menu::new(8);
        menu.set_count(5).unwrap();
        menu.set_level(4).unwrap();
        menu.set_count(2).unwrap();
        assert_eq!(menu.level(), 1);
        assert_eq!(menu.set_count(0), Err(Error::InvalidMenuCount));
    }
}
