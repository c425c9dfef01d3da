//! The thread scheduler.
//!
//! [`Threads`] is itself a task: each resumption is one scheduler tick. A tick
//! steps every live thread until it yields, spawning children depth first, and
//! then advances the clocks of the threads that yielded by the playback delta.

use crate::context::use_playback;
use crate::error::Result;
use crate::threading::task::{BoxedTask, Step, Task};
use crate::threading::thread::Thread;

/// Scheduler over a tree of threads rooted at one task.
pub struct Threads {
    root: Option<BoxedTask>,
    main: Option<Thread>,
    /// Threads to resume on the next tick, in resumption order.
    threads: Vec<Thread>,
}

/// Run `root` as the main thread of a new scheduler.
pub fn threads(root: impl Task + 'static) -> Threads {
    Threads::new(root)
}

impl Threads {
    pub fn new(root: impl Task + 'static) -> Self {
        let root: BoxedTask = Box::new(root);
        Self {
            root: Some(root),
            main: None,
            threads: Vec::new(),
        }
    }

    /// The thread running the root task, once the first tick happened.
    pub fn main_thread(&self) -> Option<&Thread> {
        self.main.as_ref()
    }

    /// Number of threads waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.threads.len()
    }

    fn start(&mut self) {
        if let Some(root) = self.root.take() {
            let main = Thread::new(root);
            if main.name().is_none() {
                main.set_name("root");
            }
            self.threads.push(main.clone());
            self.main = Some(main);
        }
    }
}

impl Task for Threads {
    fn resume(&mut self) -> Result<Step> {
        self.start();
        let dt = use_playback()?.delta_time();

        // Popped from the back, so the stack holds the list reversed.
        let mut stack: Vec<Thread> = self.threads.drain(..).rev().collect();
        let mut suspended: Vec<Thread> = Vec::with_capacity(stack.len());

        while let Some(thread) = stack.pop() {
            if thread.is_done() {
                continue;
            }
            let step = match thread.next() {
                Ok(step) => step,
                Err(err) => {
                    // The failed thread is cancelled so its cleanup runs; the
                    // rest keep their place for the next tick.
                    thread.cancel();
                    log::debug!("{} failed: {err}", thread.describe());
                    suspended.extend(stack.drain(..).rev());
                    suspended.retain(|thread| !thread.is_done());
                    self.threads = suspended;
                    return Err(err);
                }
            };
            match step {
                Step::Done => thread.finish(),
                Step::Spawn(child) => {
                    thread.add(&child);
                    stack.push(thread);
                    stack.push(child);
                }
                Step::Yield => {
                    thread.update(dt);
                    suspended.push(thread);
                }
            }
        }

        suspended.retain(|thread| !thread.is_done());
        self.threads = suspended;
        if self.threads.is_empty() {
            Ok(Step::Done)
        } else {
            Ok(Step::Yield)
        }
    }

    fn cancel(&mut self) {
        if let Some(main) = &self.main {
            main.cancel();
        }
        for thread in self.threads.drain(..) {
            thread.cancel();
        }
    }

    fn name(&self) -> Option<&str> {
        Some("threads")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{end_playback, start_playback};
    use crate::playback::PlaybackStatus;
    use crate::threading::task::from_fn;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tick(runner: &mut Threads, status: &Rc<PlaybackStatus>) -> Step {
        start_playback(status);
        let step = runner.resume();
        end_playback(status).unwrap();
        step.unwrap()
    }

    #[test]
    fn spawned_children_run_before_parent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let child_log = log.clone();
        let parent_log = log.clone();
        let mut spawned = false;
        let root = from_fn(move || {
            if !spawned {
                spawned = true;
                let sink = child_log.clone();
                let child = Thread::new(from_fn(move || {
                    sink.borrow_mut().push("child");
                    Ok(Step::Done)
                }));
                return Ok(Step::Spawn(child));
            }
            parent_log.borrow_mut().push("parent");
            Ok(Step::Done)
        });

        let status = Rc::new(PlaybackStatus::new(10.0));
        let mut runner = threads(root);
        assert!(matches!(tick(&mut runner, &status), Step::Done));
        assert_eq!(*log.borrow(), vec!["child", "parent"]);
        assert!(runner.main_thread().unwrap().is_done());
    }

    #[test]
    fn yielded_threads_advance_by_delta() {
        let mut frames = 0;
        let root = from_fn(move || {
            frames += 1;
            Ok(if frames > 3 { Step::Done } else { Step::Yield })
        });
        let status = Rc::new(PlaybackStatus::new(10.0));
        let mut runner = threads(root);
        for _ in 0..3 {
            assert!(matches!(tick(&mut runner, &status), Step::Yield));
        }
        let main = runner.main_thread().unwrap().clone();
        assert!((main.fixed() - 0.3).abs() < 1e-9);
        assert!(matches!(tick(&mut runner, &status), Step::Done));
        assert_eq!(main.name().as_deref(), Some("root"));
    }

    #[test]
    fn failed_step_cancels_the_thread_and_keeps_its_siblings() {
        use crate::error::MotionError;
        use crate::flow::all;
        use crate::threading::TaskExt;
        use std::cell::Cell;

        let cleaned = Rc::new(Cell::new(false));
        let flag = cleaned.clone();
        let mut failing_calls = 0;
        let failing = from_fn(move || {
            failing_calls += 1;
            if failing_calls == 2 {
                return Err(MotionError::parse("bad frame"));
            }
            Ok(Step::Yield)
        })
        .with_cleanup(move || flag.set(true));

        let resumes = Rc::new(Cell::new(0));
        let counter = resumes.clone();
        let survivor = from_fn(move || {
            counter.set(counter.get() + 1);
            Ok(if counter.get() == 6 { Step::Done } else { Step::Yield })
        });

        let status = Rc::new(PlaybackStatus::new(10.0));
        let mut runner = threads(all([failing.boxed(), survivor.boxed()]));
        assert!(matches!(tick(&mut runner, &status), Step::Yield));

        start_playback(&status);
        let failed = runner.resume();
        end_playback(&status).unwrap();
        assert!(failed.is_err());
        assert!(cleaned.get());
        assert_eq!(runner.pending(), 2);

        let main = runner.main_thread().unwrap().clone();
        let mut ticks = 0;
        while matches!(tick(&mut runner, &status), Step::Yield) {
            ticks += 1;
            assert!(ticks < 20);
        }
        assert_eq!(resumes.get(), 6);
        assert_eq!(main.state(), crate::threading::ThreadState::Finished);
    }

    #[test]
    fn requires_playback_context() {
        let mut runner = threads(from_fn(|| Ok(Step::Done)));
        assert!(runner.resume().is_err());
    }
}
