//! Damped spring simulation.
//!
//! The oscillator is integrated with a fixed physical timestep taken from
//! [`SpringSettings`]. Each frame simulates as many steps as fit into the
//! thread time elapsed since the start, so the settle time does not depend on
//! the frame rate; only the frame that observes it does.

use serde::{Deserialize, Serialize};

use crate::config::SpringSettings;
use crate::context::{try_use_playback, use_logger, use_thread};
use crate::error::{MotionError, Result};
use crate::logging::LogPayload;
use crate::threading::{Step, Task, TIME_EPSILON};

/// Physical parameters of a damped harmonic oscillator.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
    #[serde(default)]
    pub initial_velocity: Option<f64>,
}

impl Default for Spring {
    fn default() -> Self {
        make_spring(0.05, 10.0, 0.5, None)
    }
}

impl Spring {
    pub fn validate(&self) -> Result<()> {
        if self.mass <= 0.0 || self.stiffness <= 0.0 || self.damping < 0.0 {
            return Err(MotionError::InvalidSpringParameters {
                mass: self.mass,
                stiffness: self.stiffness,
                damping: self.damping,
            });
        }
        Ok(())
    }
}

pub const fn make_spring(
    mass: f64,
    stiffness: f64,
    damping: f64,
    initial_velocity: Option<f64>,
) -> Spring {
    Spring {
        mass,
        stiffness,
        damping,
        initial_velocity,
    }
}

pub const BEAT_SPRING: Spring = make_spring(0.13, 5.7, 1.2, Some(10.0));
pub const PLOP_SPRING: Spring = make_spring(0.2, 20.0, 0.68, Some(0.0));
pub const BOUNCE_SPRING: Spring = make_spring(0.08, 4.75, 0.05, Some(0.0));
pub const SWING_SPRING: Spring = make_spring(0.39, 19.85, 2.82, Some(0.0));
pub const JUMP_SPRING: Spring = make_spring(0.04, 10.0, 0.7, Some(8.0));
pub const STRIKE_SPRING: Spring = make_spring(0.03, 20.0, 0.9, Some(4.8));
pub const SMOOTH_SPRING: Spring = make_spring(0.16, 15.35, 1.88, Some(0.0));

type ProgressFn = Box<dyn FnMut(f64, f64)>;
type EndFn = Box<dyn FnOnce(f64, f64)>;

struct Simulation {
    start: f64,
    sim_time: f64,
    position: f64,
    velocity: f64,
}

/// Task animating a value from `from` to `to` with a spring.
///
/// `on_progress(position, velocity)` runs every frame; `on_end(to, elapsed)`
/// runs once the spring settled.
pub struct SpringTask {
    spring: Spring,
    from: f64,
    to: f64,
    settings: Option<SpringSettings>,
    on_progress: ProgressFn,
    on_end: Option<EndFn>,
    simulation: Option<Simulation>,
}

pub fn spring(
    spring: Spring,
    from: f64,
    to: f64,
    on_progress: impl FnMut(f64, f64) + 'static,
) -> SpringTask {
    SpringTask {
        spring,
        from,
        to,
        settings: None,
        on_progress: Box::new(on_progress),
        on_end: None,
        simulation: None,
    }
}

impl SpringTask {
    /// Override the settle tolerance taken from the active playback config.
    pub fn settle_tolerance(mut self, tolerance: f64) -> Self {
        let mut settings = self.settings.unwrap_or_else(current_settings);
        settings.settle_tolerance = tolerance;
        self.settings = Some(settings);
        self
    }

    pub fn on_end(mut self, on_end: impl FnOnce(f64, f64) + 'static) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }

    fn settle(&mut self, elapsed: f64) {
        (self.on_progress)(self.to, 0.0);
        if let Some(on_end) = self.on_end.take() {
            on_end(self.to, elapsed);
        }
    }
}

fn current_settings() -> SpringSettings {
    try_use_playback()
        .map(|playback| playback.config().spring)
        .unwrap_or_default()
}

impl Task for SpringTask {
    fn resume(&mut self) -> Result<Step> {
        let thread = use_thread()?;
        let settings = *self.settings.get_or_insert_with(current_settings);

        let Some(sim) = self.simulation.as_mut() else {
            if let Err(err) = self.spring.validate().and_then(|_| settings.validate()) {
                use_logger().error(LogPayload::new(err.to_string()));
                (self.on_progress)(self.from, 0.0);
                return Ok(Step::Done);
            }
            let velocity = self.spring.initial_velocity.unwrap_or(0.0);
            self.simulation = Some(Simulation {
                start: thread.time(),
                sim_time: 0.0,
                position: self.from,
                velocity,
            });
            (self.on_progress)(self.from, velocity);
            return Ok(Step::Yield);
        };

        let Spring {
            mass,
            stiffness,
            damping,
            ..
        } = self.spring;
        let step = settings.simulation_step;
        let elapsed = thread.fixed() - sim.start;

        while sim.sim_time + step <= elapsed + TIME_EPSILON {
            let force = -stiffness * (sim.position - self.to) - damping * sim.velocity;
            sim.velocity += force / mass * step;
            sim.position += sim.velocity * step;
            sim.sim_time += step;

            let settled = (sim.position - self.to).abs() < settings.settle_tolerance
                && sim.velocity.abs() < settings.settle_tolerance;
            let capped = sim.sim_time >= settings.max_duration;
            if settled || capped {
                if !settled {
                    use_logger().warn(
                        LogPayload::new("Spring did not settle and was snapped to its target.")
                            .with_remarks(format!(
                                "Simulated for {:.3}s with mass = {mass}, stiffness = {stiffness}, damping = {damping}.",
                                sim.sim_time
                            )),
                    );
                }
                let sim_time = sim.sim_time;
                thread.set_time(sim.start + sim_time);
                self.settle(sim_time);
                return Ok(Step::Done);
            }
        }

        (self.on_progress)(sim.position, sim.velocity);
        Ok(Step::Yield)
    }

    fn name(&self) -> Option<&str> {
        Some("spring")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{end_playback, start_playback};
    use crate::playback::PlaybackStatus;
    use crate::threading::Threads;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn settle_time(spring_config: Spring, fps: f64) -> f64 {
        let elapsed = Rc::new(Cell::new(f64::NAN));
        let sink = elapsed.clone();
        let task = spring(spring_config, 0.0, 1.0, |_, _| {}).on_end(move |_, time| sink.set(time));
        let status = Rc::new(PlaybackStatus::new(fps));
        let mut runner = Threads::new(task);
        for _ in 0..(fps as usize * 40) {
            start_playback(&status);
            let step = runner.resume().unwrap();
            end_playback(&status).unwrap();
            if matches!(step, Step::Done) {
                break;
            }
        }
        elapsed.get()
    }

    #[test]
    fn settle_time_is_frame_rate_independent() {
        let base = settle_time(PLOP_SPRING, 60.0);
        assert!(base.is_finite() && base > 0.0);
        for fps in [24.0, 120.0] {
            let other = settle_time(PLOP_SPRING, fps);
            assert!((other - base).abs() <= 1.0 / fps, "fps {fps}: {other} vs {base}");
        }
    }

    #[test]
    fn ends_exactly_at_target() {
        let last = Rc::new(RefCell::new(Vec::new()));
        let sink = last.clone();
        let task = spring(SMOOTH_SPRING, 2.0, 5.0, move |value, velocity| {
            sink.borrow_mut().push((value, velocity))
        });
        let status = Rc::new(PlaybackStatus::new(30.0));
        let mut runner = Threads::new(task);
        loop {
            start_playback(&status);
            let step = runner.resume().unwrap();
            end_playback(&status).unwrap();
            if matches!(step, Step::Done) {
                break;
            }
        }
        let last = last.borrow();
        assert_eq!(last.first(), Some(&(2.0, 0.0)));
        assert_eq!(last.last(), Some(&(5.0, 0.0)));
    }

    fn first_frame(task: SpringTask, status: &Rc<PlaybackStatus>) -> Step {
        let mut runner = Threads::new(task);
        start_playback(status);
        let step = runner.resume().unwrap();
        end_playback(status).unwrap();
        step
    }

    #[test]
    fn invalid_parameters_report_resting_value_once() {
        for bad in [
            make_spring(0.0, 10.0, 1.0, None),
            make_spring(1.0, 0.0, 1.0, None),
            make_spring(1.0, -5.0, 1.0, None),
            make_spring(1.0, 10.0, -0.5, None),
        ] {
            let calls = Rc::new(RefCell::new(Vec::new()));
            let sink = calls.clone();
            let task = spring(bad, 3.0, 7.0, move |value, _| sink.borrow_mut().push(value));
            let status = Rc::new(PlaybackStatus::new(30.0));
            assert!(matches!(first_frame(task, &status), Step::Done), "{bad:?}");
            assert_eq!(*calls.borrow(), vec![3.0], "{bad:?}");
            assert!(bad.validate().is_err());
        }
    }

    #[test]
    fn zero_damping_is_allowed() {
        assert!(make_spring(1.0, 10.0, 0.0, None).validate().is_ok());
    }

    #[test]
    fn broken_simulation_step_finishes_instead_of_hanging() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        let task = spring(PLOP_SPRING, 1.0, 2.0, move |value, _| sink.borrow_mut().push(value));
        let status = Rc::new(PlaybackStatus::new(30.0));
        let mut config = status.config().clone();
        config.spring.simulation_step = 0.0;
        assert!(PlaybackStatus::from_config(&config).is_err());

        let task = SpringTask {
            settings: Some(config.spring),
            ..task
        };
        assert!(matches!(first_frame(task, &status), Step::Done));
        assert_eq!(*calls.borrow(), vec![1.0]);
    }

    #[test]
    fn presets_are_valid() {
        for preset in [
            BEAT_SPRING,
            PLOP_SPRING,
            BOUNCE_SPRING,
            SWING_SPRING,
            JUMP_SPRING,
            STRIKE_SPRING,
            SMOOTH_SPRING,
        ] {
            preset.validate().unwrap();
        }
    }
}
