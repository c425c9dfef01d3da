//! Sequential composition.

use std::collections::VecDeque;
use std::fmt;

use crate::error::Result;
use crate::threading::{BoxedTask, Step, Task, TaskExt};

type Callback = Box<dyn FnOnce() -> anyhow::Result<()>>;

/// One entry of a [`chain`]: a task, or a callback run inline.
pub enum FlowItem {
    Task(BoxedTask),
    Call(Callback),
}

impl<T: Task + 'static> From<T> for FlowItem {
    fn from(task: T) -> Self {
        FlowItem::Task(task.boxed())
    }
}

impl fmt::Debug for FlowItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowItem::Task(task) => write!(f, "Task({})", task.name().unwrap_or("anonymous")),
            FlowItem::Call(_) => f.write_str("Call(..)"),
        }
    }
}

/// Wrap a side effect as a chain entry.
pub fn callback(f: impl FnOnce() -> anyhow::Result<()> + 'static) -> FlowItem {
    FlowItem::Call(Box::new(f))
}

pub struct Chain {
    items: VecDeque<FlowItem>,
    active: Option<BoxedTask>,
}

/// Run `items` one after another. Callbacks do not consume a frame.
pub fn chain(items: impl IntoIterator<Item = FlowItem>) -> Chain {
    Chain {
        items: items.into_iter().collect(),
        active: None,
    }
}

impl Task for Chain {
    fn resume(&mut self) -> Result<Step> {
        loop {
            if let Some(task) = self.active.as_mut() {
                match task.resume()? {
                    Step::Done => self.active = None,
                    step => return Ok(step),
                }
                continue;
            }
            match self.items.pop_front() {
                None => return Ok(Step::Done),
                Some(FlowItem::Call(callback)) => callback()?,
                Some(FlowItem::Task(task)) => self.active = Some(task),
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(mut task) = self.active.take() {
            task.cancel();
        }
        self.items.clear();
    }

    fn name(&self) -> Option<&str> {
        Some("chain")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threading::{from_fn, noop};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn record(log: &Rc<RefCell<Vec<&'static str>>>, entry: &'static str) -> FlowItem {
        let log = log.clone();
        callback(move || {
            log.borrow_mut().push(entry);
            Ok(())
        })
    }

    #[test]
    fn callbacks_run_inline_between_tasks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut yielded = false;
        let sink = log.clone();
        let mut task = chain([
            record(&log, "start"),
            from_fn(move || {
                if !yielded {
                    yielded = true;
                    sink.borrow_mut().push("task");
                    return Ok(Step::Yield);
                }
                Ok(Step::Done)
            })
            .into(),
            noop().into(),
            record(&log, "end"),
        ]);

        assert!(matches!(task.resume().unwrap(), Step::Yield));
        assert_eq!(*log.borrow(), vec!["start", "task"]);
        assert!(matches!(task.resume().unwrap(), Step::Done));
        assert_eq!(*log.borrow(), vec!["start", "task", "end"]);
    }

    #[test]
    fn failing_callback_stops_the_chain() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut task = chain([
            callback(|| anyhow::bail!("broken")),
            record(&log, "after"),
        ]);
        assert!(task.resume().is_err());
        assert!(log.borrow().is_empty());
    }
}
