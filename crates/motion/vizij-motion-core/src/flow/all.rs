//! Run tasks concurrently and wait for every one of them.

use crate::error::Result;
use crate::flow::join::{join, Fork, Join};
use crate::threading::{BoxedTask, Step, Task};

pub struct All {
    fork: Fork,
    join: Option<Join>,
}

/// Start every task on its own child thread, then wait until all finished.
///
/// Children are stepped in the order given, before the waiting parent.
pub fn all(tasks: impl IntoIterator<Item = BoxedTask>) -> All {
    All {
        fork: Fork::new(tasks),
        join: None,
    }
}

impl Task for All {
    fn resume(&mut self) -> Result<Step> {
        if let Some(spawn) = self.fork.spawn_next() {
            return Ok(spawn);
        }
        let fork = &self.fork;
        self.join
            .get_or_insert_with(|| join(true, fork.spawned().to_vec()))
            .resume()
    }

    fn cancel(&mut self) {
        self.fork.clear_pending();
    }

    fn name(&self) -> Option<&str> {
        Some("all")
    }
}
