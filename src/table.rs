//! Per-button action bindings keyed by event and menu level.

use heapless::Vec;

use crate::Action;
use crate::error::Error;
use crate::event::{Event, EventMask};

type Row = [Option<Action>; Event::COUNT];

/// One row of actions per menu level, as many rows as the menu count the
/// table was created with. `MENUS` is only the storage capacity.
///
/// Unbound cells resolve to nothing. The enable mask decides which events the
/// button detects at all; binding a long press, auto-repeat or double-click
/// action switches detection of that event on.
#[derive(Debug, Clone)]
pub struct ActionTable<const MENUS: usize> {
    rows: Vec<Row, MENUS>,
    mask: EventMask,
}

impl<const MENUS: usize> ActionTable<MENUS> {
    pub fn new(menu_count: u8) -> Result<Self, Error> {
        let mut rows = Vec::new();
        rows.resize(usize::from(menu_count), [None; Event::COUNT])
            .map_err(|_| Error::MenuCountTooLarge {
                count: menu_count,
                capacity: MENUS,
            })?;
        Ok(Self {
            rows,
            mask: EventMask::DEFAULT,
        })
    }

    pub fn menu_count(&self) -> u8 {
        // Never above the count `new` was given
        self.rows.len() as u8
    }

    pub fn bind(&mut self, event: Event, menu_level: u8, action: Action) -> Result<(), Error> {
        *self.cell(event, menu_level)? = Some(action);
        if matches!(
            event,
            Event::LongKeyPress | Event::AutoRepeatPress | Event::DoubleClick
        ) {
            self.mask.insert(event);
        }
        Ok(())
    }

    /// Clear a cell. Clearing an empty cell is fine.
    pub fn unbind(&mut self, event: Event, menu_level: u8) -> Result<(), Error> {
        *self.cell(event, menu_level)? = None;
        Ok(())
    }

    pub fn lookup(&self, event: Event, menu_level: u8) -> Option<Action> {
        self.rows
            .get(usize::from(menu_level))
            .and_then(|row| row[event as usize])
    }

    /// Like [`lookup`](Self::lookup) but rejects levels the table cannot hold
    pub fn resolve(&self, event: Event, menu_level: u8) -> Result<Option<Action>, Error> {
        self.check_level(menu_level)?;
        Ok(self.lookup(event, menu_level))
    }

    /// Number of bound cells
    pub fn len(&self) -> usize {
        self.rows.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mask(&self) -> EventMask {
        self.mask
    }

    pub fn enable(&mut self, events: impl Into<EventMask>) {
        self.mask.insert(events);
    }

    pub fn disable(&mut self, events: impl Into<EventMask>) {
        self.mask.remove(events);
    }

    pub fn is_enabled(&self, event: Event) -> bool {
        self.mask.contains(event)
    }

    fn cell(&mut self, event: Event, menu_level: u8) -> Result<&mut Option<Action>, Error> {
        self.check_level(menu_level)?;
        Ok(&mut self.rows[usize::from(menu_level)][event as usize])
    }

    fn check_level(&self, level: u8) -> Result<(), Error> {
        if level < self.menu_count() {
            Ok(())
        } else {
            Err(Error::MenuLevelOutOfRange {
                level,
                count: self.menu_count(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first() {}

    fn second() {
        let _ = core::hint::black_box(2);
    }

    fn table(menu_count: u8) -> ActionTable<8> {
        ActionTable::new(menu_count).unwrap()
    }

    #[test]
    fn when_bound_it_resolves_only_at_its_level() {
        let mut table = table(3);
        table.bind(Event::KeyPress, 1, first).unwrap();
        assert_eq!(table.lookup(Event::KeyPress, 1), Some(first as Action));
        assert_eq!(table.lookup(Event::KeyPress, 0), None);
        assert_eq!(table.lookup(Event::KeyDown, 1), None);
    }

    #[test]
    fn when_bound_twice_the_latest_action_wins() {
        let mut table = table(1);
        table.bind(Event::KeyDown, 0, first).unwrap();
        table.bind(Event::KeyDown, 0, second).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(Event::KeyDown, 0), Some(second as Action));
    }

    #[test]
    fn when_unbound_lookup_finds_nothing() {
        let mut table = table(1);
        table.bind(Event::KeyUp, 0, first).unwrap();
        table.unbind(Event::KeyUp, 0).unwrap();
        table.unbind(Event::KeyUp, 0).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.lookup(Event::KeyUp, 0), None);
    }

    #[test]
    fn when_level_is_out_of_range_it_is_rejected() {
        let mut table = table(2);
        assert_eq!(
            table.bind(Event::KeyPress, 2, first),
            Err(Error::MenuLevelOutOfRange { level: 2, count: 2 })
        );
        assert!(table.unbind(Event::KeyPress, 5).is_err());
        assert!(table.is_empty());
        assert_eq!(table.lookup(Event::KeyPress, 2), None);
    }

    #[test]
    fn when_gesture_action_is_bound_its_detection_is_enabled() {
        let mut table = table(1);
        assert!(!table.is_enabled(Event::DoubleClick));
        table.bind(Event::DoubleClick, 0, first).unwrap();
        assert!(table.is_enabled(Event::DoubleClick));
        table.disable(Event::DoubleClick);
        assert!(!table.is_enabled(Event::DoubleClick));
        assert!(table.lookup(Event::DoubleClick, 0).is_some());
    }

    #[test]
    fn when_basic_action_is_bound_the_mask_is_untouched() {
        let mut table = table(1);
        table.disable(Event::KeyPress);
        table.bind(Event::KeyPress, 0, first).unwrap();
        assert!(!table.is_enabled(Event::KeyPress));
    }

    #[test]
    fn when_every_cell_at_every_level_is_bound_none_fails() {
        let mut table = table(8);
        for level in 0..8 {
            for event in Event::ALL {
                table.bind(event, level, first).unwrap();
            }
        }
        assert_eq!(table.len(), 8 * Event::COUNT);
        assert!(Event::ALL.iter().all(|e| table.lookup(*e, 7).is_some()));
    }

    #[test]
    fn when_menu_count_exceeds_the_capacity_creation_fails() {
        assert!(matches!(
            ActionTable::<2>::new(3),
            Err(Error::MenuCountTooLarge {
                count: 3,
                capacity: 2
            })
        ));
    }
}
