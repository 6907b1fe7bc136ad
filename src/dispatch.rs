//! Moves resolved actions out of interrupt context, onto a task-serviced async
//! queue or an application-drained sync queue as the [`Mode`] says.

use core::cell::{Cell, RefCell};

use embassy_sync::{
    blocking_mutex::{Mutex, raw::CriticalSectionRawMutex},
    channel::Channel,
};
use heapless::Deque;

use crate::error::Error;
use crate::event::Event;
use crate::log;
use crate::{ASYNC_EVENT_QUEUE_DEPTH, Action, SYNC_EVENT_QUEUE_DEPTH};

/// How resolved actions are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Every action goes through the async consumer task
    Asynchronous,
    /// KeyDown and KeyUp go through the async task for quick feedback, the rest
    /// wait for the application loop
    Hybrid,
    /// Every action waits for the application loop
    #[default]
    Synchronous,
}

impl Mode {
    pub fn route(self, event: Event) -> Route {
        match (self, event) {
            (Mode::Asynchronous, _) => Route::Async,
            (Mode::Hybrid, Event::KeyDown | Event::KeyUp) => Route::Async,
            (Mode::Hybrid, _) => Route::Sync,
            (Mode::Synchronous, _) => Route::Sync,
        }
    }

    /// Whether any event would be routed to the async queue
    pub fn uses_async(self) -> bool {
        !matches!(self, Mode::Synchronous)
    }
}

/// The queue an action was handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Route {
    Async,
    Sync,
}

/// Outcome of handing an action over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dispatched {
    pub route: Route,
    /// The async queue was empty, so its consumer is likely parked and has just
    /// been woken. An interrupt handler may want to yield to it.
    pub wake_consumer: bool,
}

type AsyncQueue = Channel<CriticalSectionRawMutex, Action, ASYNC_EVENT_QUEUE_DEPTH>;
type SyncQueue = Mutex<CriticalSectionRawMutex, RefCell<Deque<Action, SYNC_EVENT_QUEUE_DEPTH>>>;

pub struct Dispatcher {
    mode: Mutex<CriticalSectionRawMutex, Cell<Mode>>,
    async_queue: AsyncQueue,
    sync_queue: SyncQueue,
    consumer_taken: Mutex<CriticalSectionRawMutex, Cell<bool>>,
    dropped: Mutex<CriticalSectionRawMutex, Cell<u32>>,
}

impl Dispatcher {
    pub const fn new() -> Self {
        Self {
            mode: Mutex::new(Cell::new(Mode::Synchronous)),
            async_queue: Channel::new(),
            sync_queue: Mutex::new(RefCell::new(Deque::new())),
            consumer_taken: Mutex::new(Cell::new(false)),
            dropped: Mutex::new(Cell::new(0)),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode.lock(Cell::get)
    }

    /// Change the mode for events dispatched from now on. Modes using the async
    /// queue need its consumer to have been taken first.
    pub fn set_mode(&self, mode: Mode) -> Result<(), Error> {
        if mode.uses_async() && !self.consumer_taken.lock(Cell::get) {
            return Err(Error::NoAsyncConsumer);
        }
        self.mode.lock(|m| m.set(mode));
        log::info!("DISPATCH: mode {}", mode);
        Ok(())
    }

    /// Hand the single consumer of the async queue out
    pub fn async_consumer(&self) -> Result<AsyncConsumer<'_>, Error> {
        self.consumer_taken.lock(|taken| {
            if taken.replace(true) {
                Err(Error::ConsumerTaken)
            } else {
                Ok(AsyncConsumer { dispatcher: self })
            }
        })
    }

    /// Queue `action` on the route the current mode picks for `event`. Never
    /// blocks, so it is safe from interrupt context.
    pub fn dispatch(&self, event: Event, action: Action) -> Result<Dispatched, Error> {
        let route = self.mode().route(event);
        let pushed = match route {
            Route::Async => {
                let was_empty = self.async_queue.is_empty();
                self.async_queue
                    .try_send(action)
                    .map(|()| was_empty)
                    .map_err(|_| ())
            }
            Route::Sync => self
                .sync_queue
                .lock(|q| q.borrow_mut().push_back(action))
                .map(|()| false)
                .map_err(|_| ()),
        };
        match pushed {
            Ok(wake_consumer) => Ok(Dispatched {
                route,
                wake_consumer,
            }),
            Err(()) => {
                self.dropped.lock(|d| d.set(d.get().wrapping_add(1)));
                log::warning!("DISPATCH: {} queue full, dropped {}", route, event);
                Err(Error::QueueFull(route))
            }
        }
    }

    /// Run the actions waiting in the sync queue, oldest first. Only what was
    /// queued when the call started is run, so an action queueing more work
    /// cannot keep this looping.
    pub fn process_sync_events(&self) -> usize {
        let pending = self.sync_queue.lock(|q| q.borrow().len());
        let mut processed = 0;
        while processed < pending {
            let Some(action) = self.sync_queue.lock(|q| q.borrow_mut().pop_front()) else {
                break;
            };
            action();
            processed += 1;
        }
        processed
    }

    pub fn pending_sync(&self) -> usize {
        self.sync_queue.lock(|q| q.borrow().len())
    }

    pub fn pending_async(&self) -> usize {
        self.async_queue.len()
    }

    /// Actions lost to full queues since start up
    pub fn dropped(&self) -> u32 {
        self.dropped.lock(Cell::get)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// The receiving end of the async queue.
///
/// Only one exists per context. Run it forever from a task with
/// [`service_async_queue`](crate::tasks::dispatch::service_async_queue).
pub struct AsyncConsumer<'a> {
    dispatcher: &'a Dispatcher,
}

impl AsyncConsumer<'_> {
    /// Wait for the next action
    pub async fn receive(&self) -> Action {
        self.dispatcher.async_queue.receive().await
    }

    pub fn try_receive(&self) -> Option<Action> {
        self.dispatcher.async_queue.try_receive().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;
    use std::vec::Vec;

    thread_local! {
        static RAN: StdRefCell<Vec<&'static str>> = const { StdRefCell::new(Vec::new()) };
    }

    fn ran() -> Vec<&'static str> {
        RAN.with(|r| r.take())
    }

    fn first() {
        RAN.with(|r| r.borrow_mut().push("first"));
    }

    fn second() {
        RAN.with(|r| r.borrow_mut().push("second"));
    }

    #[test]
    fn when_hybrid_only_down_and_up_go_async() {
        assert_eq!(Mode::Hybrid.route(Event::KeyDown), Route::Async);
        assert_eq!(Mode::Hybrid.route(Event::KeyUp), Route::Async);
        for event in [
            Event::KeyPress,
            Event::LongKeyPress,
            Event::AutoRepeatPress,
            Event::DoubleClick,
        ] {
            assert_eq!(Mode::Hybrid.route(event), Route::Sync);
        }
        assert!(Event::ALL.iter().all(|e| Mode::Asynchronous.route(*e) == Route::Async));
        assert!(Event::ALL.iter().all(|e| Mode::Synchronous.route(*e) == Route::Sync));
    }

    #[test]
    fn when_sync_queue_is_processed_actions_run_in_order() {
        let dispatcher = Dispatcher::new();
        dispatcher.dispatch(Event::KeyDown, first).unwrap();
        dispatcher.dispatch(Event::KeyUp, second).unwrap();
        dispatcher.dispatch(Event::KeyPress, first).unwrap();
        assert!(ran().is_empty());
        assert_eq!(dispatcher.process_sync_events(), 3);
        assert_eq!(ran(), ["first", "second", "first"]);
    }

    #[test]
    fn when_sync_queue_is_empty_processing_is_a_no_op() {
        let dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.process_sync_events(), 0);
        assert_eq!(dispatcher.process_sync_events(), 0);
        assert!(ran().is_empty());
    }

    #[test]
    fn when_sync_queue_is_full_the_action_is_dropped_and_counted() {
        let dispatcher = Dispatcher::new();
        for _ in 0..SYNC_EVENT_QUEUE_DEPTH {
            dispatcher.dispatch(Event::KeyPress, first).unwrap();
        }
        assert_eq!(
            dispatcher.dispatch(Event::KeyPress, second),
            Err(Error::QueueFull(Route::Sync))
        );
        assert_eq!(dispatcher.dropped(), 1);
        assert_eq!(dispatcher.process_sync_events(), SYNC_EVENT_QUEUE_DEPTH);
        assert!(ran().iter().all(|name| *name == "first"));
    }

    #[test]
    fn when_async_mode_is_set_without_consumer_it_is_rejected() {
        let dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.set_mode(Mode::Hybrid), Err(Error::NoAsyncConsumer));
        assert_eq!(dispatcher.mode(), Mode::Synchronous);
        let _consumer = dispatcher.async_consumer().unwrap();
        assert!(matches!(dispatcher.async_consumer(), Err(Error::ConsumerTaken)));
        dispatcher.set_mode(Mode::Asynchronous).unwrap();
        assert_eq!(dispatcher.mode(), Mode::Asynchronous);
    }

    #[test]
    fn when_async_queue_is_full_the_action_is_dropped() {
        let dispatcher = Dispatcher::new();
        let consumer = dispatcher.async_consumer().unwrap();
        dispatcher.set_mode(Mode::Asynchronous).unwrap();

        let first_push = dispatcher.dispatch(Event::KeyDown, first).unwrap();
        assert_eq!(first_push.route, Route::Async);
        assert!(first_push.wake_consumer);
        for _ in 1..ASYNC_EVENT_QUEUE_DEPTH {
            let pushed = dispatcher.dispatch(Event::KeyDown, second).unwrap();
            assert!(!pushed.wake_consumer);
        }
        assert_eq!(
            dispatcher.dispatch(Event::KeyUp, first),
            Err(Error::QueueFull(Route::Async))
        );
        assert_eq!(dispatcher.pending_async(), ASYNC_EVENT_QUEUE_DEPTH);

        let action = embassy_futures::block_on(consumer.receive());
        action();
        while let Some(action) = consumer.try_receive() {
            action();
        }
        assert_eq!(ran(), ["first", "second", "second", "second", "second"]);
    }

    #[test]
    fn when_an_action_queues_more_work_processing_still_ends() {
        fn requeue() {
            RAN.with(|r| r.borrow_mut().push("requeue"));
            DISPATCHER.with(|d| {
                let _ = d.dispatch(Event::KeyPress, requeue);
            });
        }
        thread_local! {
            static DISPATCHER: Dispatcher = const { Dispatcher::new() };
        }
        DISPATCHER.with(|d| {
            d.dispatch(Event::KeyPress, requeue).unwrap();
            assert_eq!(d.process_sync_events(), 1);
            assert_eq!(d.pending_sync(), 1);
        });
        assert_eq!(ran(), ["requeue"]);
    }
}
