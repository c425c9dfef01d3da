//! Cooperative threads and their scheduler.

pub mod task;
pub mod thread;
pub mod threads;

pub use task::{from_fn, noop, task_name, BoxedTask, Step, Task, TaskExt};
pub use thread::{Thread, ThreadId, ThreadState};
pub use threads::{threads, Threads};

/// Slack used when comparing accumulated frame clocks against targets.
pub(crate) const TIME_EPSILON: f64 = 1e-9;
