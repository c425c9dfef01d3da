//! Cooperative threads.
//!
//! A [`Thread`] owns one task, a parent link and a local clock. `time` is the
//! precise local time that waits and tweens jump to on completion, `fixed`
//! only ever grows by the frame delta and is what time-based tasks compare
//! against to decide whether to keep yielding.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::context::{end_thread, start_thread};
use crate::error::Result;
use crate::threading::task::{BoxedTask, Step, Task};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub u32);

thread_local! {
    static NEXT_THREAD_ID: Cell<u32> = const { Cell::new(0) };
}

fn alloc_thread_id() -> ThreadId {
    NEXT_THREAD_ID.with(|next| {
        let id = next.get();
        next.set(id.wrapping_add(1));
        ThreadId(id)
    })
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ThreadState {
    /// Being resumed right now.
    Running,
    /// Waiting for its next resumption.
    Suspended,
    /// The task returned.
    Finished,
    Cancelled,
}

struct ThreadInner {
    id: ThreadId,
    runner: RefCell<Option<BoxedTask>>,
    parent: RefCell<Weak<ThreadInner>>,
    children: RefCell<Vec<Thread>>,
    time: Cell<f64>,
    fixed: Cell<f64>,
    state: Cell<ThreadState>,
    paused: Cell<bool>,
    name: RefCell<Option<String>>,
}

/// Shared handle to a cooperative thread.
#[derive(Clone)]
pub struct Thread {
    inner: Rc<ThreadInner>,
}

impl Thread {
    pub fn new(task: impl Task + 'static) -> Self {
        let name = task.name().map(str::to_string);
        let runner: BoxedTask = Box::new(task);
        Self {
            inner: Rc::new(ThreadInner {
                id: alloc_thread_id(),
                runner: RefCell::new(Some(runner)),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                time: Cell::new(0.0),
                fixed: Cell::new(0.0),
                state: Cell::new(ThreadState::Suspended),
                paused: Cell::new(false),
                name: RefCell::new(name),
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> ThreadId {
        self.inner.id
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.inner.time.get()
    }

    pub fn set_time(&self, time: f64) {
        self.inner.time.set(time);
    }

    #[inline]
    pub fn fixed(&self) -> f64 {
        self.inner.fixed.get()
    }

    #[inline]
    pub fn state(&self) -> ThreadState {
        self.inner.state.get()
    }

    /// Finished or cancelled.
    pub fn is_done(&self) -> bool {
        matches!(
            self.state(),
            ThreadState::Finished | ThreadState::Cancelled
        )
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == ThreadState::Cancelled
    }

    pub fn parent(&self) -> Option<Thread> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Thread { inner })
    }

    pub fn children(&self) -> Vec<Thread> {
        self.inner.children.borrow().clone()
    }

    pub fn name(&self) -> Option<String> {
        self.inner.name.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.inner.name.borrow_mut() = Some(name.into());
    }

    pub fn pause(&self, paused: bool) {
        self.inner.paused.set(paused);
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.get()
    }

    pub fn ptr_eq(&self, other: &Thread) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Label used in diagnostics.
    pub fn describe(&self) -> String {
        match self.inner.name.borrow().as_deref() {
            Some(name) => format!("{name} ({})", self.inner.id.0),
            None => format!("thread {}", self.inner.id.0),
        }
    }

    /// Adopt `child`: it inherits this thread's clocks.
    pub fn add(&self, child: &Thread) {
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        child.inner.time.set(self.time());
        child.inner.fixed.set(self.fixed());
        self.inner.children.borrow_mut().push(child.clone());
    }

    /// Advance both clocks by `dt` and forget children that ended.
    pub fn update(&self, dt: f64) {
        if !self.is_paused() {
            self.inner.time.set(self.time() + dt);
            self.inner.fixed.set(self.fixed() + dt);
        }
        self.inner
            .children
            .borrow_mut()
            .retain(|child| !child.is_done());
    }

    /// Resume the task once with this thread as the active context.
    pub fn next(&self) -> Result<Step> {
        if self.is_done() {
            return Ok(Step::Done);
        }
        if self.is_paused() {
            return Ok(Step::Yield);
        }
        let runner = self.inner.runner.borrow_mut().take();
        let Some(mut runner) = runner else {
            return Ok(Step::Done);
        };

        self.inner.state.set(ThreadState::Running);
        start_thread(self);
        let result = runner.resume();
        let ended = end_thread(self);

        if self.is_cancelled() {
            // Cancelled from inside its own step.
            runner.cancel();
        } else {
            *self.inner.runner.borrow_mut() = Some(runner);
            self.inner.state.set(ThreadState::Suspended);
        }

        let step = result?;
        ended?;
        Ok(step)
    }

    /// Mark the task as returned and cancel every child still running.
    pub(crate) fn finish(&self) {
        if self.is_done() {
            return;
        }
        self.inner.state.set(ThreadState::Finished);
        self.inner.runner.borrow_mut().take();
        self.cancel_children();
    }

    /// Cancel the task and all of its children.
    pub fn cancel(&self) {
        if self.is_done() {
            return;
        }
        self.inner.state.set(ThreadState::Cancelled);
        let runner = self.inner.runner.borrow_mut().take();
        if let Some(mut runner) = runner {
            runner.cancel();
        }
        self.cancel_children();
    }

    fn cancel_children(&self) {
        let children = std::mem::take(&mut *self.inner.children.borrow_mut());
        for child in children {
            child.cancel();
        }
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name.borrow())
            .field("state", &self.state())
            .field("time", &self.time())
            .field("fixed", &self.fixed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{stack_depths, use_thread};
    use crate::threading::task::{from_fn, TaskExt};
    use std::rc::Rc;

    #[test]
    fn next_pushes_thread_context() {
        let seen = Rc::new(Cell::new(None));
        let sink = seen.clone();
        let thread = Thread::new(from_fn(move || {
            sink.set(Some(use_thread()?.id()));
            Ok(Step::Done)
        }));
        assert!(matches!(thread.next().unwrap(), Step::Done));
        assert_eq!(seen.get(), Some(thread.id()));
        assert_eq!(stack_depths().0, 0);
    }

    #[test]
    fn children_inherit_clocks_and_cancel_with_parent() {
        let parent = Thread::new(from_fn(|| Ok(Step::Yield)));
        parent.update(0.5);
        let cleaned = Rc::new(Cell::new(false));
        let flag = cleaned.clone();
        let child = Thread::new(from_fn(|| Ok(Step::Yield)).with_cleanup(move || flag.set(true)));
        parent.add(&child);
        assert_eq!(child.time(), 0.5);
        assert_eq!(child.fixed(), 0.5);
        assert!(child.parent().unwrap().ptr_eq(&parent));

        parent.cancel();
        assert!(child.is_cancelled());
        assert!(cleaned.get());
    }

    #[test]
    fn paused_threads_keep_their_clock() {
        let thread = Thread::new(from_fn(|| Ok(Step::Yield)));
        thread.pause(true);
        thread.update(1.0);
        assert_eq!(thread.time(), 0.0);
        assert!(matches!(thread.next().unwrap(), Step::Yield));
        thread.pause(false);
        thread.update(1.0);
        assert_eq!(thread.fixed(), 1.0);
    }

    #[test]
    fn thread_takes_task_name() {
        let thread = Thread::new(from_fn(|| Ok(Step::Done)).named("intro"));
        assert_eq!(thread.name().as_deref(), Some("intro"));
        assert!(thread.describe().starts_with("intro"));
    }

    #[test]
    fn self_cancel_runs_cleanup_after_step() {
        let cleaned = Rc::new(Cell::new(false));
        let flag = cleaned.clone();
        let thread = Thread::new(
            from_fn(|| {
                use_thread()?.cancel();
                Ok(Step::Yield)
            })
            .with_cleanup(move || flag.set(true)),
        );
        thread.next().unwrap();
        assert!(thread.is_cancelled());
        assert!(cleaned.get());
    }
}
