//! Time based tween task.

use crate::context::use_thread;
use crate::error::Result;
use crate::threading::{Step, Task, Thread, TIME_EPSILON};

/// A span of thread time measured against the thread's `fixed` clock.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Window {
    start: f64,
    end: f64,
}

impl Window {
    pub(crate) fn open(thread: &Thread, seconds: f64) -> Self {
        let start = thread.time();
        Self {
            start,
            end: start + seconds,
        }
    }

    /// Time elapsed since the start while the window is open, `None` once
    /// the thread clock reached the end.
    pub(crate) fn elapsed(&self, thread: &Thread) -> Option<f64> {
        if self.end > thread.fixed() + TIME_EPSILON {
            Some(thread.fixed() - self.start)
        } else {
            None
        }
    }

    /// Jump the precise clock to the exact end.
    pub(crate) fn close(&self, thread: &Thread) {
        thread.set_time(self.end);
    }
}

type ProgressFn = Box<dyn FnMut(f64, f64)>;
type EndFn = Box<dyn FnOnce()>;

/// Calls `on_progress(progress, elapsed)` once per frame for `seconds` of
/// thread time. `progress` is linear in `[0, 1]`, apply a timing function to
/// ease it.
pub struct Tween {
    seconds: f64,
    on_progress: ProgressFn,
    on_end: Option<EndFn>,
    window: Option<Window>,
}

pub fn tween(seconds: f64, on_progress: impl FnMut(f64, f64) + 'static) -> Tween {
    Tween {
        seconds,
        on_progress: Box::new(on_progress),
        on_end: None,
        window: None,
    }
}

impl Tween {
    /// Called once after the final progress report.
    pub fn on_end(mut self, on_end: impl FnOnce() + 'static) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }

    fn complete(&mut self) {
        (self.on_progress)(1.0, self.seconds.max(0.0));
        if let Some(on_end) = self.on_end.take() {
            on_end();
        }
    }
}

impl Task for Tween {
    fn resume(&mut self) -> Result<Step> {
        let thread = use_thread()?;
        let window = match self.window {
            Some(window) => window,
            None => {
                let window = Window::open(&thread, self.seconds);
                self.window = Some(window);
                if self.seconds <= 0.0 {
                    self.complete();
                    return Ok(Step::Done);
                }
                (self.on_progress)(0.0, 0.0);
                window
            }
        };

        if let Some(elapsed) = window.elapsed(&thread) {
            if elapsed > 0.0 {
                (self.on_progress)(elapsed / self.seconds, elapsed);
            }
            return Ok(Step::Yield);
        }

        window.close(&thread);
        self.complete();
        Ok(Step::Done)
    }

    fn name(&self) -> Option<&str> {
        Some("tween")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{end_playback, start_playback};
    use crate::playback::PlaybackStatus;
    use crate::threading::Threads;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn drive(task: impl Task + 'static, fps: f64, max_ticks: usize) -> usize {
        let status = Rc::new(PlaybackStatus::new(fps));
        let mut runner = Threads::new(task);
        for tick in 1..=max_ticks {
            start_playback(&status);
            let step = runner.resume().unwrap();
            end_playback(&status).unwrap();
            if matches!(step, Step::Done) {
                return tick;
            }
        }
        max_ticks
    }

    #[test]
    fn reports_progress_each_frame_then_completes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let ended = Rc::new(RefCell::new(false));
        let flag = ended.clone();
        let task = tween(1.0, move |progress, _| sink.borrow_mut().push(progress))
            .on_end(move || *flag.borrow_mut() = true);

        assert_eq!(drive(task, 10.0, 100), 11);
        let seen = seen.borrow();
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&1.0));
        assert!((seen[5] - 0.5).abs() < 1e-9);
        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(*ended.borrow());
    }

    #[test]
    fn zero_duration_finishes_without_yielding() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let task = tween(0.0, move |progress, _| sink.borrow_mut().push(progress));
        assert_eq!(drive(task, 30.0, 10), 1);
        assert_eq!(*seen.borrow(), vec![1.0]);
    }

    #[test]
    fn outside_a_thread_fails() {
        let mut task = tween(1.0, |_, _| {});
        assert!(task.resume().is_err());
    }
}
