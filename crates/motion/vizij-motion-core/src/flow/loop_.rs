//! Repetition by count or condition.

use std::fmt;

use crate::context::{use_logger, use_thread};
use crate::error::Result;
use crate::logging::LogPayload;
use crate::threading::{BoxedTask, Step, Task};

/// How many times a [`Loop`] repeats.
pub enum LoopCount {
    Times(usize),
    Infinite,
    /// Keep going while the predicate holds, checked before each iteration.
    While(Box<dyn FnMut() -> bool>),
}

impl fmt::Debug for LoopCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopCount::Times(count) => f.debug_tuple("Times").field(count).finish(),
            LoopCount::Infinite => f.write_str("Infinite"),
            LoopCount::While(_) => f.write_str("While(..)"),
        }
    }
}

type Factory = Box<dyn FnMut(usize) -> Option<BoxedTask>>;

pub struct Loop {
    count: LoopCount,
    factory: Factory,
    index: usize,
    started: bool,
    active: Option<BoxedTask>,
}

/// Run `factory(i)` for each iteration. A factory returning `None` still
/// takes one frame, so synchronous bodies cannot spin.
///
/// Infinite loops are refused on the main thread: the error is logged and
/// the loop finishes immediately.
pub fn loop_(
    count: LoopCount,
    factory: impl FnMut(usize) -> Option<BoxedTask> + 'static,
) -> Loop {
    Loop {
        count,
        factory: Box::new(factory),
        index: 0,
        started: false,
        active: None,
    }
}

pub fn loop_times(
    count: usize,
    factory: impl FnMut(usize) -> Option<BoxedTask> + 'static,
) -> Loop {
    loop_(LoopCount::Times(count), factory)
}

impl Loop {
    fn should_continue(&mut self) -> bool {
        match &mut self.count {
            LoopCount::Times(count) => self.index < *count,
            LoopCount::Infinite => true,
            LoopCount::While(predicate) => predicate(),
        }
    }
}

impl Task for Loop {
    fn resume(&mut self) -> Result<Step> {
        if !self.started {
            self.started = true;
            if matches!(self.count, LoopCount::Infinite) && use_thread()?.parent().is_none() {
                use_logger().error(
                    LogPayload::new("Tried to execute an infinite loop in the main thread.")
                        .with_remarks(
                            "Infinite loops block the rest of the animation. Run the loop on a \
                             child thread, for example inside `all` or `any`, or give it a count.",
                        ),
                );
                return Ok(Step::Done);
            }
        }

        loop {
            if let Some(task) = self.active.as_mut() {
                match task.resume()? {
                    Step::Done => {
                        self.active = None;
                        self.index += 1;
                    }
                    step => return Ok(step),
                }
                continue;
            }
            if !self.should_continue() {
                return Ok(Step::Done);
            }
            match (self.factory)(self.index) {
                Some(task) => self.active = Some(task),
                None => {
                    self.index += 1;
                    return Ok(Step::Yield);
                }
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(mut task) = self.active.take() {
            task.cancel();
        }
    }

    fn name(&self) -> Option<&str> {
        Some("loop")
    }
}
