use embassy_futures::yield_now;

use crate::AsyncConsumer;
use crate::log;

/// Run actions from the async queue as they arrive. Never returns.
///
/// Spawn this from an executor task with the consumer taken from the context,
/// before switching the context to a mode that uses the async queue.
pub async fn service_async_queue(consumer: AsyncConsumer<'_>) {
    log::info!("DISPATCH_TASK: Task started. Waiting for actions...");
    loop {
        let action = consumer.receive().await;
        action();
        // Give other tasks a turn between back to back actions
        yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ButtonContext, Event, Mode};
    use core::cell::Cell;
    use embassy_futures::{block_on, select::select};

    thread_local! {
        static RUNS: Cell<u32> = const { Cell::new(0) };
    }

    fn count() {
        RUNS.with(|r| r.set(r.get() + 1));
    }

    #[test]
    fn when_actions_are_queued_the_consumer_runs_them() {
        let context = ButtonContext::new();
        let consumer = context.async_consumer().unwrap();
        context.set_mode(Mode::Asynchronous).unwrap();
        context.dispatcher().dispatch(Event::KeyDown, count).unwrap();
        context.dispatcher().dispatch(Event::KeyUp, count).unwrap();

        block_on(select(service_async_queue(consumer), async {
            while RUNS.with(Cell::get) < 2 {
                yield_now().await;
            }
        }));

        assert_eq!(RUNS.with(Cell::get), 2);
        assert_eq!(context.dispatcher().pending_async(), 0);
    }
}
