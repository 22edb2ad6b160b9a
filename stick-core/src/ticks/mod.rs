//! Tick based scheduling.
//!
//! - [`TaskQueue`] - tasks waiting for a game tick, with cancellation
//! - [`Throttle`] - per-handler rate limiting on top of the queue

mod task_queue;
mod throttle;

pub use task_queue::{RunId, TaskQueue};
pub use throttle::Throttle;
