//! Repetition for a span of time.

use crate::context::{use_playback, use_thread};
use crate::error::Result;
use crate::threading::{BoxedTask, Step, Task, TIME_EPSILON};

type Factory = Box<dyn FnMut(usize) -> Option<BoxedTask>>;

pub struct LoopFor {
    seconds: f64,
    factory: Factory,
    index: usize,
    /// Target time and frame length, fixed on the first resume.
    target: Option<(f64, f64)>,
    active: Option<BoxedTask>,
}

/// Run `factory(i)` repeatedly until `seconds` of thread time passed. An
/// iteration still in progress at that point is finished first; the thread
/// clock then lands exactly on the target.
pub fn loop_for(
    seconds: f64,
    factory: impl FnMut(usize) -> Option<BoxedTask> + 'static,
) -> LoopFor {
    LoopFor {
        seconds,
        factory: Box::new(factory),
        index: 0,
        target: None,
        active: None,
    }
}

impl Task for LoopFor {
    fn resume(&mut self) -> Result<Step> {
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

        loop {
            if let Some(task) = self.active.as_mut() {
                match task.resume()? {
                    Step::Done => self.active = None,
                    step => return Ok(step),
                }
                continue;
            }
            if target - frame <= thread.fixed() + TIME_EPSILON {
                thread.set_time(target);
                return Ok(Step::Done);
            }
            let index = self.index;
            self.index += 1;
            match (self.factory)(index) {
                Some(task) => self.active = Some(task),
                None => return Ok(Step::Yield),
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(mut task) = self.active.take() {
            task.cancel();
        }
    }

    fn name(&self) -> Option<&str> {
        Some("loop for")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{end_playback, start_playback};
    use crate::playback::PlaybackStatus;
    use crate::threading::Threads;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn iterates_once_per_frame_until_the_time_is_up() {
        let iterations = Rc::new(Cell::new(0));
        let counter = iterations.clone();
        let task = loop_for(1.0, move |_| {
            counter.set(counter.get() + 1);
            None
        });
        let status = Rc::new(PlaybackStatus::new(10.0));
        let mut runner = Threads::new(task);
        let mut ticks = 0;
        loop {
            ticks += 1;
            start_playback(&status);
            let step = runner.resume().unwrap();
            end_playback(&status).unwrap();
            if matches!(step, Step::Done) {
                break;
            }
        }
        assert_eq!(ticks, 10);
        assert_eq!(iterations.get(), 9);
        assert_eq!(runner.main_thread().unwrap().time(), 1.0);
    }
}
