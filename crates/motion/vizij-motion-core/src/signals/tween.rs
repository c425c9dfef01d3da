//! Chainable signal animations.
//!
//! [`SignalTween`] is a task built from a queue of steps. `to` and `back`
//! interpolate the target, `wait` idles, `call` runs a callback inline and
//! `run` delegates to another task. Steps that take no time run back to back
//! within the same resume.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::context::use_thread;
use crate::error::Result;
use crate::threading::{BoxedTask, Step, Task, TaskExt};
use crate::tweening::helpers::clamp;
use crate::tweening::interpolation::InterpolationFn;
use crate::tweening::timing::{ease_in_out_cubic, TimingFn};
use crate::tweening::tween::Window;

/// Something a [`SignalTween`] can animate.
pub trait TweenTarget: Clone + 'static {
    type Value: Clone + 'static;

    /// Value the next tween starts from.
    fn tween_from(&self) -> Result<Self::Value>;

    fn interpolation(&self) -> InterpolationFn<Self::Value>;

    /// Store an intermediate value while tweening.
    fn set_tweened(&self, value: Self::Value) -> Result<()>;

    /// Snap to the exact target and leave the tweening state.
    fn finish_tween(&self, value: Self::Value);

    fn set_tweening(&self, tweening: bool);
}

type Callback = Box<dyn FnOnce() -> anyhow::Result<()>>;

enum TweenStep<V> {
    To {
        to: V,
        seconds: f64,
        timing: Option<TimingFn>,
        interpolation: Option<InterpolationFn<V>>,
    },
    Back {
        seconds: f64,
        timing: Option<TimingFn>,
        interpolation: Option<InterpolationFn<V>>,
    },
    Wait(f64),
    Call(Callback),
    Run(BoxedTask),
}

enum Active<V> {
    Tween {
        from: V,
        to: V,
        seconds: f64,
        window: Window,
        timing: TimingFn,
        interpolation: InterpolationFn<V>,
    },
    Wait(Window),
    Run(BoxedTask),
}

pub struct SignalTween<S: TweenTarget> {
    target: S,
    steps: VecDeque<TweenStep<S::Value>>,
    active: Option<Active<S::Value>>,
    /// Endpoints of the most recent `to`, reversed by `back`.
    previous: Option<(S::Value, S::Value)>,
}

impl<S: TweenTarget> SignalTween<S> {
    pub fn new(target: S) -> Self {
        Self {
            target,
            steps: VecDeque::new(),
            active: None,
            previous: None,
        }
    }

    pub fn to(mut self, to: S::Value, seconds: f64) -> Self {
        self.steps.push_back(TweenStep::To {
            to,
            seconds,
            timing: None,
            interpolation: None,
        });
        self
    }

    /// Return to where the previous `to` started.
    pub fn back(mut self, seconds: f64) -> Self {
        self.steps.push_back(TweenStep::Back {
            seconds,
            timing: None,
            interpolation: None,
        });
        self
    }

    pub fn wait(mut self, seconds: f64) -> Self {
        self.steps.push_back(TweenStep::Wait(seconds));
        self
    }

    pub fn call(mut self, callback: impl FnOnce() -> anyhow::Result<()> + 'static) -> Self {
        self.steps.push_back(TweenStep::Call(Box::new(callback)));
        self
    }

    pub fn run(mut self, task: impl Task + 'static) -> Self {
        self.steps.push_back(TweenStep::Run(task.boxed()));
        self
    }

    /// Timing function of the last `to` or `back` step.
    pub fn timing(mut self, timing: impl Fn(f64) -> f64 + 'static) -> Self {
        let timing: TimingFn = Rc::new(timing);
        if let Some(TweenStep::To { timing: slot, .. } | TweenStep::Back { timing: slot, .. }) =
            self.steps.back_mut()
        {
            *slot = Some(timing);
        }
        self
    }

    /// Interpolation of the last `to` or `back` step.
    pub fn interpolation(
        mut self,
        interpolation: impl Fn(&S::Value, &S::Value, f64) -> S::Value + 'static,
    ) -> Self {
        let interpolation: InterpolationFn<S::Value> = Rc::new(interpolation);
        if let Some(
            TweenStep::To {
                interpolation: slot,
                ..
            }
            | TweenStep::Back {
                interpolation: slot,
                ..
            },
        ) = self.steps.back_mut()
        {
            *slot = Some(interpolation);
        }
        self
    }

    /// Start the next queued step. Returns `false` when the queue is empty.
    fn start_next(&mut self) -> Result<bool> {
        let Some(step) = self.steps.pop_front() else {
            return Ok(false);
        };
        match step {
            TweenStep::Call(callback) => callback()?,
            TweenStep::Run(task) => self.active = Some(Active::Run(task)),
            TweenStep::Wait(seconds) => {
                let thread = use_thread()?;
                self.active = Some(Active::Wait(Window::open(&thread, seconds)));
            }
            TweenStep::To {
                to,
                seconds,
                timing,
                interpolation,
            } => {
                let from = self.target.tween_from()?;
                self.begin(from, to, seconds, timing, interpolation)?;
            }
            TweenStep::Back {
                seconds,
                timing,
                interpolation,
            } => {
                if let Some((from, _)) = self.previous.clone() {
                    let current = self.target.tween_from()?;
                    self.begin(current, from, seconds, timing, interpolation)?;
                }
            }
        }
        Ok(true)
    }

    fn begin(
        &mut self,
        from: S::Value,
        to: S::Value,
        seconds: f64,
        timing: Option<TimingFn>,
        interpolation: Option<InterpolationFn<S::Value>>,
    ) -> Result<()> {
        self.previous = Some((from.clone(), to.clone()));
        if seconds <= 0.0 {
            self.target.finish_tween(to);
            return Ok(());
        }
        let thread = use_thread()?;
        let timing = timing.unwrap_or_else(|| Rc::new(ease_in_out_cubic));
        let interpolation = interpolation.unwrap_or_else(|| self.target.interpolation());
        self.target.set_tweening(true);
        self.target
            .set_tweened(interpolation(&from, &to, timing(0.0)))?;
        self.active = Some(Active::Tween {
            from,
            to,
            seconds,
            window: Window::open(&thread, seconds),
            timing,
            interpolation,
        });
        Ok(())
    }
}

impl<S: TweenTarget> Task for SignalTween<S> {
    fn resume(&mut self) -> Result<Step> {
        loop {
            let Some(active) = self.active.take() else {
                if self.start_next()? {
                    continue;
                }
                return Ok(Step::Done);
            };

            match active {
                Active::Tween {
                    from,
                    to,
                    seconds,
                    window,
                    timing,
                    interpolation,
                } => {
                    let thread = use_thread()?;
                    match window.elapsed(&thread) {
                        Some(elapsed) => {
                            if elapsed > 0.0 {
                                let progress = timing(clamp(0.0, 1.0, elapsed / seconds));
                                if let Err(err) =
                                    self.target.set_tweened(interpolation(&from, &to, progress))
                                {
                                    self.target.set_tweening(false);
                                    return Err(err);
                                }
                            }
                            self.active = Some(Active::Tween {
                                from,
                                to,
                                seconds,
                                window,
                                timing,
                                interpolation,
                            });
                            return Ok(Step::Yield);
                        }
                        None => {
                            window.close(&thread);
                            self.target.finish_tween(to);
                        }
                    }
                }
                Active::Wait(window) => {
                    let thread = use_thread()?;
                    if window.elapsed(&thread).is_some() {
                        self.active = Some(Active::Wait(window));
                        return Ok(Step::Yield);
                    }
                    window.close(&thread);
                }
                Active::Run(mut task) => match task.resume()? {
                    Step::Done => {}
                    step => {
                        self.active = Some(Active::Run(task));
                        return Ok(step);
                    }
                },
            }
        }
    }

    fn cancel(&mut self) {
        match self.active.take() {
            Some(Active::Run(mut task)) => task.cancel(),
            Some(Active::Tween { .. }) => self.target.set_tweening(false),
            _ => {}
        }
        self.steps.clear();
    }

    fn name(&self) -> Option<&str> {
        Some("signal tween")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{end_playback, start_playback};
    use crate::playback::PlaybackStatus;
    use crate::signals::Signal;
    use crate::threading::Threads;
    use crate::tweening::timing::linear;
    use std::cell::{Cell, RefCell};

    fn run_ticks(task: impl Task + 'static, fps: f64, ticks: usize) -> Threads {
        let status = Rc::new(PlaybackStatus::new(fps));
        let mut runner = Threads::new(task);
        for _ in 0..ticks {
            start_playback(&status);
            runner.resume().unwrap();
            end_playback(&status).unwrap();
        }
        runner
    }

    #[test]
    fn to_and_back_return_to_start() {
        let signal = Signal::new(0.0);
        let task = signal.tween(4.0, 0.5).timing(linear).back(0.5);
        let runner = run_ticks(task, 10.0, 20);
        assert!(runner.main_thread().unwrap().is_done());
        assert_eq!(signal.get().unwrap(), 0.0);
        assert!(!signal.is_tweening());
    }

    #[test]
    fn zero_duration_snaps_without_yielding() {
        let signal = Signal::new(1.0);
        let called = Rc::new(Cell::new(false));
        let flag = called.clone();
        let task = signal
            .tween(3.0, 0.0)
            .call(move || {
                flag.set(true);
                Ok(())
            });
        let runner = run_ticks(task, 30.0, 1);
        assert!(runner.main_thread().unwrap().is_done());
        assert_eq!(signal.get().unwrap(), 3.0);
        assert!(called.get());
    }

    #[test]
    fn wait_holds_value() {
        let signal = Signal::new(0.0);
        let task = SignalTween::new(signal.clone())
            .wait(1.0)
            .to(2.0, 0.0);
        run_ticks(task, 10.0, 5);
        assert_eq!(signal.get().unwrap(), 0.0);
    }

    #[test]
    fn run_passes_sub_task_yields_through() {
        use crate::threading::from_fn;

        let signal = Signal::new(0.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let reader = signal.clone();
        let mut resumes = 0;
        let called = Rc::new(Cell::new(false));
        let flag = called.clone();
        let task = signal
            .tween(1.0, 0.0)
            .run(from_fn(move || {
                resumes += 1;
                sink.borrow_mut().push(reader.get()?);
                Ok(if resumes == 3 { Step::Done } else { Step::Yield })
            }))
            .call(move || {
                flag.set(true);
                Ok(())
            });

        let status = Rc::new(PlaybackStatus::new(10.0));
        let mut runner = Threads::new(task);
        for _ in 0..2 {
            start_playback(&status);
            assert!(matches!(runner.resume().unwrap(), Step::Yield));
            end_playback(&status).unwrap();
        }
        assert!(!called.get());

        start_playback(&status);
        assert!(matches!(runner.resume().unwrap(), Step::Done));
        end_playback(&status).unwrap();
        assert!(called.get());
        assert_eq!(*seen.borrow(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn interpolation_overrides_apply_to_one_step() {
        let signal = Signal::new(0.0);
        let task = signal
            .tween(10.0, 1.0)
            .timing(linear)
            .interpolation(|from: &f64, to: &f64, t: f64| from + (to - from) * t * t);
        run_ticks(task, 10.0, 6);
        approx::assert_relative_eq!(signal.get().unwrap(), 2.5, epsilon = 1e-9);

        let plain = Signal::new(0.0);
        run_ticks(plain.tween(10.0, 1.0).timing(linear), 10.0, 6);
        approx::assert_relative_eq!(plain.get().unwrap(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn cancel_clears_tweening_flag() {
        let signal = Signal::new(0.0);
        let mut runner = run_ticks(signal.tween(1.0, 2.0), 10.0, 3);
        assert!(signal.is_tweening());
        runner.cancel();
        assert!(!signal.is_tweening());
    }

    #[test]
    fn callback_errors_surface() {
        let signal = Signal::new(0.0);
        let task = SignalTween::new(signal).call(|| anyhow::bail!("nope"));
        let status = Rc::new(PlaybackStatus::new(10.0));
        let mut runner = Threads::new(task);
        start_playback(&status);
        let result = runner.resume();
        end_playback(&status).unwrap();
        assert!(result.is_err());
    }
}
