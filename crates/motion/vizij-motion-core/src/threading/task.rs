//! The resumable task abstraction.
//!
//! A task is a hand-written coroutine: every call to [`Task::resume`] runs it
//! up to its next suspension point and reports what happened through a
//! [`Step`]. Cancelling a task runs its cleanup (the equivalent of a
//! `finally` block); tasks that already reported [`Step::Done`] are never
//! cancelled.

use crate::error::Result;
use crate::threading::Thread;

/// Outcome of one resumption.
pub enum Step {
    /// Suspend until the next scheduler tick.
    Yield,
    /// Start a child thread, then resume this task again in the same tick.
    Spawn(Thread),
    /// The task has finished.
    Done,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Yield => f.write_str("Yield"),
            Step::Spawn(thread) => write!(f, "Spawn({})", thread.describe()),
            Step::Done => f.write_str("Done"),
        }
    }
}

pub trait Task {
    fn resume(&mut self) -> Result<Step>;

    /// Abandon the task before it finished.
    fn cancel(&mut self) {}

    /// Diagnostic label, if one was attached.
    fn name(&self) -> Option<&str> {
        None
    }
}

pub type BoxedTask = Box<dyn Task>;

impl Task for Box<dyn Task> {
    fn resume(&mut self) -> Result<Step> {
        (**self).resume()
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }

    fn name(&self) -> Option<&str> {
        (**self).name()
    }
}

/// Combinators available on every task.
pub trait TaskExt: Task + Sized + 'static {
    fn boxed(self) -> BoxedTask {
        Box::new(self)
    }

    fn named(self, name: impl Into<String>) -> Named<Self> {
        Named {
            name: name.into(),
            inner: self,
        }
    }

    /// Run `cleanup` once, when the task finishes or is cancelled.
    fn with_cleanup<F: FnOnce() + 'static>(self, cleanup: F) -> WithCleanup<Self, F> {
        WithCleanup {
            inner: self,
            cleanup: Some(cleanup),
        }
    }
}

impl<T: Task + 'static> TaskExt for T {}

/// Label of a task, `None` if it was never named.
pub fn task_name(task: &dyn Task) -> Option<&str> {
    task.name()
}

pub struct Named<T> {
    name: String,
    inner: T,
}

impl<T: Task> Task for Named<T> {
    fn resume(&mut self) -> Result<Step> {
        self.inner.resume()
    }

    fn cancel(&mut self) {
        self.inner.cancel()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

pub struct WithCleanup<T, F: FnOnce()> {
    inner: T,
    cleanup: Option<F>,
}

impl<T: Task, F: FnOnce()> WithCleanup<T, F> {
    fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl<T: Task, F: FnOnce()> Task for WithCleanup<T, F> {
    fn resume(&mut self) -> Result<Step> {
        let step = match self.inner.resume() {
            Ok(step) => step,
            Err(err) => {
                self.run_cleanup();
                return Err(err);
            }
        };
        if matches!(step, Step::Done) {
            self.run_cleanup();
        }
        Ok(step)
    }

    fn cancel(&mut self) {
        self.inner.cancel();
        self.run_cleanup();
    }

    fn name(&self) -> Option<&str> {
        self.inner.name()
    }
}

/// Task driven by a closure returning the next [`Step`].
pub struct FnTask<F> {
    step: F,
    finished: bool,
}

/// Build a task from a closure. The closure is not called again after it
/// returns `Step::Done`.
pub fn from_fn<F>(step: F) -> FnTask<F>
where
    F: FnMut() -> Result<Step>,
{
    FnTask {
        step,
        finished: false,
    }
}

impl<F: FnMut() -> Result<Step>> Task for FnTask<F> {
    fn resume(&mut self) -> Result<Step> {
        if self.finished {
            return Ok(Step::Done);
        }
        let step = (self.step)()?;
        if matches!(step, Step::Done) {
            self.finished = true;
        }
        Ok(step)
    }
}

/// Task that finishes immediately.
pub struct Noop;

pub fn noop() -> Noop {
    Noop
}

impl Task for Noop {
    fn resume(&mut self) -> Result<Step> {
        Ok(Step::Done)
    }
}
