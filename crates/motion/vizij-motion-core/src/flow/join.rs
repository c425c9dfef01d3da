//! Waiting on other threads.

use std::collections::VecDeque;

use crate::context::use_thread;
use crate::error::Result;
use crate::threading::{BoxedTask, Step, Task, Thread};

/// Suspend until all (or any) of `threads` finished, then move the current
/// thread's clock to when they did.
///
/// With `all`, the clock moves to the latest finish time; otherwise to the
/// earliest finish time among the finished threads. The clock never moves
/// backwards.
pub struct Join {
    all: bool,
    threads: Vec<Thread>,
    start: Option<f64>,
}

pub fn join(all: bool, threads: Vec<Thread>) -> Join {
    Join {
        all,
        threads,
        start: None,
    }
}

impl Task for Join {
    fn resume(&mut self) -> Result<Step> {
        let parent = use_thread()?;
        let start = *self.start.get_or_insert_with(|| parent.time());
        if self.threads.is_empty() {
            return Ok(Step::Done);
        }

        let finished = if self.all {
            self.threads.iter().all(Thread::is_done)
        } else {
            self.threads.iter().any(Thread::is_done)
        };
        if !finished {
            return Ok(Step::Yield);
        }

        let times = self
            .threads
            .iter()
            .filter(|thread| thread.is_done())
            .map(Thread::time);
        let child_time = if self.all {
            times.fold(f64::NEG_INFINITY, f64::max)
        } else {
            times.fold(f64::INFINITY, f64::min)
        };
        parent.set_time(start.max(child_time));
        Ok(Step::Done)
    }

    fn name(&self) -> Option<&str> {
        Some(if self.all { "join all" } else { "join any" })
    }
}

/// Spawns queued tasks one per resume and remembers their threads.
pub(crate) struct Fork {
    pending: VecDeque<BoxedTask>,
    spawned: Vec<Thread>,
}

impl Fork {
    pub(crate) fn new(tasks: impl IntoIterator<Item = BoxedTask>) -> Self {
        let pending: VecDeque<BoxedTask> = tasks.into_iter().collect();
        Self {
            spawned: Vec::with_capacity(pending.len()),
            pending,
        }
    }

    /// The spawn step for the next queued task, if any is left.
    pub(crate) fn spawn_next(&mut self) -> Option<Step> {
        let task = self.pending.pop_front()?;
        let thread = Thread::new(task);
        self.spawned.push(thread.clone());
        Some(Step::Spawn(thread))
    }

    pub(crate) fn spawned(&self) -> &[Thread] {
        &self.spawned
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending.clear();
    }
}
