//! Staggered concurrent start.

use crate::error::Result;
use crate::flow::join::{join, Fork, Join};
use crate::flow::scheduling::{wait_for, WaitFor};
use crate::threading::{BoxedTask, Step, Task};

pub struct Sequence {
    delay: f64,
    fork: Fork,
    waiting: Option<WaitFor>,
    join: Option<Join>,
}

/// Start each task on its own thread, waiting `delay` seconds after each
/// start, then wait until every task finished.
pub fn sequence(delay: f64, tasks: impl IntoIterator<Item = BoxedTask>) -> Sequence {
    Sequence {
        delay,
        fork: Fork::new(tasks),
        waiting: None,
        join: None,
    }
}

impl Task for Sequence {
    fn resume(&mut self) -> Result<Step> {
        loop {
            if let Some(wait) = self.waiting.as_mut() {
                match wait.resume()? {
                    Step::Done => self.waiting = None,
                    step => return Ok(step),
                }
                continue;
            }
            if let Some(spawn) = self.fork.spawn_next() {
                self.waiting = Some(wait_for(self.delay));
                return Ok(spawn);
            }
            let fork = &self.fork;
            return self
                .join
                .get_or_insert_with(|| join(true, fork.spawned().to_vec()))
                .resume();
        }
    }

    fn cancel(&mut self) {
        self.fork.clear_pending();
        self.waiting = None;
    }

    fn name(&self) -> Option<&str> {
        Some("sequence")
    }
}
