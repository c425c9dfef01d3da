//! Waiting primitives.

use crate::context::{use_playback, use_thread};
use crate::error::Result;
use crate::threading::{BoxedTask, Step, Task, TaskExt, Thread, TIME_EPSILON};

/// Suspend the current thread for `seconds` of thread time.
pub struct WaitFor {
    seconds: f64,
    /// Target time and frame length, fixed on the first resume.
    target: Option<(f64, f64)>,
    waited: bool,
    after: Option<BoxedTask>,
}

pub fn wait_for(seconds: f64) -> WaitFor {
    WaitFor {
        seconds,
        target: None,
        waited: false,
        after: None,
    }
}

impl WaitFor {
    /// Continue with `task` once the wait is over.
    pub fn then(mut self, task: impl Task + 'static) -> Self {
        self.after = Some(task.boxed());
        self
    }
}

impl Task for WaitFor {
    fn resume(&mut self) -> Result<Step> {
        if !self.waited {
            let thread = use_thread()?;
            let (target, frame) = match self.target {
                Some(target) => target,
                None => {
                    let frame = use_playback()?.frames_to_seconds(1.0);
                    let target = (thread.time() + self.seconds, frame);
                    self.target = Some(target);
                    target
                }
            };
            if target - frame > thread.fixed() + TIME_EPSILON {
                return Ok(Step::Yield);
            }
            thread.set_time(target);
            self.waited = true;
        }

        match self.after.as_mut() {
            Some(after) => after.resume(),
            None => Ok(Step::Done),
        }
    }

    fn cancel(&mut self) {
        if let Some(after) = self.after.as_mut() {
            after.cancel();
        }
    }

    fn name(&self) -> Option<&str> {
        Some("wait for")
    }
}

/// Yield every frame until `predicate` returns `true`.
pub struct WaitUntil<F> {
    predicate: F,
}

pub fn wait_until<F: FnMut() -> bool>(predicate: F) -> WaitUntil<F> {
    WaitUntil { predicate }
}

impl<F: FnMut() -> bool> Task for WaitUntil<F> {
    fn resume(&mut self) -> Result<Step> {
        if (self.predicate)() {
            Ok(Step::Done)
        } else {
            Ok(Step::Yield)
        }
    }
}

/// Cancel each thread along with its children.
pub fn cancel(threads: &[Thread]) {
    for thread in threads {
        thread.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{end_playback, start_playback};
    use crate::playback::PlaybackStatus;
    use crate::threading::{from_fn, Threads};
    use std::cell::Cell;
    use std::rc::Rc;

    fn ticks_until_done(task: impl Task + 'static, fps: f64) -> (usize, Threads) {
        let status = Rc::new(PlaybackStatus::new(fps));
        let mut runner = Threads::new(task);
        for tick in 1..1000 {
            start_playback(&status);
            let step = runner.resume().unwrap();
            end_playback(&status).unwrap();
            if matches!(step, Step::Done) {
                return (tick, runner);
            }
        }
        panic!("task never finished");
    }

    #[test]
    fn wait_for_finishes_on_the_frame_covering_the_target() {
        let time = Rc::new(Cell::new(0.0));
        let sink = time.clone();
        let task = wait_for(1.0).then(from_fn(move || {
            sink.set(use_thread()?.time());
            Ok(Step::Done)
        }));
        let (ticks, _) = ticks_until_done(task, 10.0);
        assert_eq!(ticks, 10);
        assert_eq!(time.get(), 1.0);
    }

    #[test]
    fn zero_wait_does_not_yield() {
        let (ticks, _) = ticks_until_done(wait_for(0.0), 30.0);
        assert_eq!(ticks, 1);
    }

    #[test]
    fn wait_until_polls_every_frame() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let (ticks, _) = ticks_until_done(
            wait_until(move || {
                counter.set(counter.get() + 1);
                counter.get() == 3
            }),
            30.0,
        );
        assert_eq!(ticks, 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn cancel_stops_threads() {
        let thread = Thread::new(from_fn(|| Ok(Step::Yield)));
        cancel(std::slice::from_ref(&thread));
        assert!(thread.is_cancelled());
    }
}
