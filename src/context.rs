//! State shared by every button.

use crate::DEFAULT_MENU_CAPACITY;
use crate::dispatch::{AsyncConsumer, Dispatcher, Mode};
use crate::error::Error;
use crate::menu::Menu;

/// State shared by every button: menu level and count, the delivery mode and
/// both queues.
///
/// Create one, usually as a `static`, and pass it to each [`Button`]. The menu
/// count is fixed when the first button is created and can never exceed
/// `MENUS`, which sizes the action table of every button. Everything else may
/// change at any time and takes effect for events not yet dispatched.
///
/// ```ignore
/// static BUTTONS: ButtonContext = ButtonContext::new();
///
/// BUTTONS.set_menu_count(3)?;
/// let consumer = BUTTONS.async_consumer()?;
/// spawner.spawn(dispatch_task(consumer))?;
/// BUTTONS.set_mode(Mode::Hybrid)?;
/// loop {
///     BUTTONS.process_sync_events();
///     ticker.next().await;
/// }
/// ```
///
/// [`Button`]: crate::Button
pub struct ButtonContext<const MENUS: usize = DEFAULT_MENU_CAPACITY> {
    menu: Menu,
    dispatcher: Dispatcher,
}

impl ButtonContext {
    /// Room for [`DEFAULT_MENU_CAPACITY`] menus
    pub const fn new() -> Self {
        Self::with_menu_capacity()
    }
}

impl<const MENUS: usize> ButtonContext<MENUS> {
    /// Room for `MENUS` menus, between 1 and 255
    pub const fn with_menu_capacity() -> Self {
        const { assert!(MENUS >= 1 && MENUS <= u8::MAX as usize) };
        Self {
            menu: Menu::new(MENUS),
            dispatcher: Dispatcher::new(),
        }
    }

    pub fn set_mode(&self, mode: Mode) -> Result<(), Error> {
        self.dispatcher.set_mode(mode)
    }

    pub fn mode(&self) -> Mode {
        self.dispatcher.mode()
    }

    /// Run queued actions. Call once per iteration of the application loop.
    pub fn process_sync_events(&self) -> usize {
        self.dispatcher.process_sync_events()
    }

    /// Take the one consumer of the async queue. Modes other than
    /// [`Mode::Synchronous`] can only be selected after this.
    pub fn async_consumer(&self) -> Result<AsyncConsumer<'_>, Error> {
        self.dispatcher.async_consumer()
    }

    /// Fails once any button has been created, or when `count` exceeds `MENUS`
    pub fn set_menu_count(&self, count: u8) -> Result<(), Error> {
        self.menu.set_count(count)
    }

    pub fn menu_count(&self) -> u8 {
        self.menu.count()
    }

    pub fn menu_capacity(&self) -> usize {
        MENUS
    }

    pub fn set_menu_level(&self, level: u8) -> Result<(), Error> {
        self.menu.set_level(level)
    }

    pub fn menu_level(&self) -> u8 {
        self.menu.level()
    }

    /// Actions lost to full queues
    pub fn dropped_actions(&self) -> u32 {
        self.dispatcher.dropped()
    }

    pub(crate) fn menu(&self) -> &Menu {
        &self.menu
    }

    pub(crate) fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Default for ButtonContext {
    fn default() -> Self {
        Self::new()
    }
}
