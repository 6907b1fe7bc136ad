//! Pin access shared by the tasks.

pub mod button;
