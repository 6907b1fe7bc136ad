//! Long running futures for an async executor. Wrap them in the executor's
//! task attribute from the application.

pub mod button;
pub mod dispatch;

pub use button::watch_button;
pub use dispatch::service_async_queue;
