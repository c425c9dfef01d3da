//! Periodic callbacks on the playback clock.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::use_playback;
use crate::error::{MotionError, Result};
use crate::threading::{Step, Task};

type TickFn = Box<dyn FnMut(u64) -> anyhow::Result<()>>;

struct EveryState {
    interval: f64,
    callback: Option<TickFn>,
    tick: u64,
    /// Frames since the last tick.
    frames: u64,
    /// Whether a tick fired during the current frame.
    changed: bool,
}

/// Controller returned by [`every`].
///
/// Nothing happens until [`Every::runner`] is scheduled on a thread.
#[derive(Clone)]
pub struct Every {
    state: Rc<RefCell<EveryState>>,
}

/// Call `callback(tick)` every `interval` seconds of playback time, starting
/// with tick `0` on the runner's first frame.
pub fn every(interval: f64, callback: impl FnMut(u64) -> anyhow::Result<()> + 'static) -> Every {
    Every {
        state: Rc::new(RefCell::new(EveryState {
            interval,
            callback: Some(Box::new(callback)),
            tick: 0,
            frames: 0,
            changed: false,
        })),
    }
}

impl Every {
    /// Task that drives the timer. It never finishes on its own.
    pub fn runner(&self) -> EveryRunner {
        EveryRunner {
            state: self.state.clone(),
            started: false,
        }
    }

    /// Task that finishes on the next frame in which the timer ticked.
    pub fn sync(&self) -> EverySync {
        EverySync {
            state: self.state.clone(),
        }
    }

    /// Change the cadence. Frames counted towards the next tick are dropped.
    pub fn set_interval(&self, interval: f64) {
        let mut state = self.state.borrow_mut();
        state.interval = interval;
        state.frames = 0;
        state.changed = false;
    }

    /// Replace the callback. Tick numbering starts over from zero.
    pub fn set_callback(&self, callback: impl FnMut(u64) -> anyhow::Result<()> + 'static) {
        let mut state = self.state.borrow_mut();
        state.callback = Some(Box::new(callback));
        state.tick = 0;
        state.changed = false;
    }

    pub fn tick(&self) -> u64 {
        self.state.borrow().tick
    }
}

fn fire(state: &RefCell<EveryState>, tick: u64) -> Result<()> {
    // Taken out while running so the callback may use the controller.
    let callback = state.borrow_mut().callback.take();
    let Some(mut callback) = callback else {
        return Ok(());
    };
    let result = callback(tick);
    {
        let mut state = state.borrow_mut();
        if state.callback.is_none() {
            state.callback = Some(callback);
        }
    }
    result.map_err(MotionError::from)
}

pub struct EveryRunner {
    state: Rc<RefCell<EveryState>>,
    started: bool,
}

impl Task for EveryRunner {
    fn resume(&mut self) -> Result<Step> {
        let playback = use_playback()?;
        if !self.started {
            self.started = true;
            let tick = self.state.borrow().tick;
            fire(&self.state, tick)?;
        }

        let fired = {
            let mut state = self.state.borrow_mut();
            if state.frames >= playback.seconds_to_frames(state.interval) {
                state.frames = 0;
                state.tick += 1;
                state.changed = true;
                Some(state.tick)
            } else {
                state.changed = false;
                None
            }
        };
        if let Some(tick) = fired {
            fire(&self.state, tick)?;
        }
        self.state.borrow_mut().frames += 1;
        Ok(Step::Yield)
    }

    fn name(&self) -> Option<&str> {
        Some("every")
    }
}

pub struct EverySync {
    state: Rc<RefCell<EveryState>>,
}

impl Task for EverySync {
    fn resume(&mut self) -> Result<Step> {
        if self.state.borrow().changed {
            Ok(Step::Done)
        } else {
            Ok(Step::Yield)
        }
    }
}
