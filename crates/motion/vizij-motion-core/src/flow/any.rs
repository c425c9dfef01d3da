//! Run tasks concurrently until the first one finishes.

use crate::error::Result;
use crate::flow::join::{join, Fork, Join};
use crate::flow::scheduling::cancel;
use crate::threading::{BoxedTask, Step, Task};

pub struct Any {
    fork: Fork,
    join: Option<Join>,
}

/// Start every task on its own child thread and wait until one finished.
///
/// The threads still running at that point are cancelled, so their cleanup
/// runs before `any` completes.
pub fn any(tasks: impl IntoIterator<Item = BoxedTask>) -> Any {
    Any {
        fork: Fork::new(tasks),
        join: None,
    }
}

impl Task for Any {
    fn resume(&mut self) -> Result<Step> {
        if let Some(spawn) = self.fork.spawn_next() {
            return Ok(spawn);
        }
        let fork = &self.fork;
        let step = self
            .join
            .get_or_insert_with(|| join(false, fork.spawned().to_vec()))
            .resume()?;
        if matches!(step, Step::Done) {
            cancel(self.fork.spawned());
        }
        Ok(step)
    }

    fn cancel(&mut self) {
        self.fork.clear_pending();
        cancel(self.fork.spawned());
    }

    fn name(&self) -> Option<&str> {
        Some("any")
    }
}
