//! Deferred task construction with an optional diagnostic name.

use crate::error::Result;
use crate::threading::{Step, Task};

/// Builds its task from `factory` on the first resume.
pub struct Run<F, T> {
    name: Option<String>,
    factory: Option<F>,
    task: Option<T>,
}

pub fn run<F, T>(factory: F) -> Run<F, T>
where
    F: FnOnce() -> T,
    T: Task,
{
    Run {
        name: None,
        factory: Some(factory),
        task: None,
    }
}

/// Like [`run`], but reported under `name` by [`task_name`](crate::threading::task_name).
pub fn run_named<F, T>(name: impl Into<String>, factory: F) -> Run<F, T>
where
    F: FnOnce() -> T,
    T: Task,
{
    Run {
        name: Some(name.into()),
        factory: Some(factory),
        task: None,
    }
}

impl<F, T> Task for Run<F, T>
where
    F: FnOnce() -> T,
    T: Task,
{
    fn resume(&mut self) -> Result<Step> {
        if let Some(factory) = self.factory.take() {
            self.task = Some(factory());
        }
        match self.task.as_mut() {
            Some(task) => task.resume(),
            None => Ok(Step::Done),
        }
    }

    fn cancel(&mut self) {
        self.factory = None;
        if let Some(task) = self.task.as_mut() {
            task.cancel();
        }
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threading::{noop, task_name, Thread};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn names_are_reported() {
        assert_eq!(task_name(&run_named("intro", noop)), Some("intro"));
        assert_eq!(task_name(&run(noop)), None);
        assert_eq!(Thread::new(run_named("outro", noop)).name().as_deref(), Some("outro"));
    }

    #[test]
    fn factory_runs_lazily_once() {
        let built = Rc::new(Cell::new(0));
        let counter = built.clone();
        let mut task = run(move || {
            counter.set(counter.get() + 1);
            noop()
        });
        assert_eq!(built.get(), 0);
        assert!(matches!(task.resume().unwrap(), Step::Done));
        assert!(matches!(task.resume().unwrap(), Step::Done));
        assert_eq!(built.get(), 1);
    }
}
