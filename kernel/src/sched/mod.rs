//! Run queue & scheduler (C4).

pub mod runqueue;
pub mod scheduler;
pub mod task;
