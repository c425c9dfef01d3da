//! Playback status and the frame driver.
//!
//! [`PlaybackStatus`] is the read side consumed by threads, waits, tweens and
//! springs (fps, frame, speed). [`PlaybackDriver`] owns a status and a
//! scheduler and advances them one frame per [`PlaybackDriver::tick`].

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::MotionConfig;
use crate::context::{end_playback, end_scene, start_playback, start_scene, Scene};
use crate::error::Result;
use crate::threading::{Step, Task, Thread, Threads};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlaybackState {
    #[default]
    Playing,
    Rendering,
    Paused,
    Presenting,
}

/// Frame clock shared with everything running inside a playback.
#[derive(Debug)]
pub struct PlaybackStatus {
    fps: Cell<f64>,
    frame: Cell<u64>,
    speed: Cell<f64>,
    /// Total length in frames, zero when unknown.
    duration: Cell<u64>,
    state: Cell<PlaybackState>,
    config: MotionConfig,
}

impl PlaybackStatus {
    pub fn new(fps: f64) -> Self {
        Self::unchecked(MotionConfig {
            fps,
            ..MotionConfig::default()
        })
    }

    /// Status seeded from a validated `config`.
    pub fn from_config(config: &MotionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::unchecked(config.clone()))
    }

    fn unchecked(config: MotionConfig) -> Self {
        Self {
            fps: Cell::new(config.fps),
            frame: Cell::new(0),
            speed: Cell::new(config.speed),
            duration: Cell::new(0),
            state: Cell::new(PlaybackState::default()),
            config,
        }
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps.get()
    }

    pub fn set_fps(&self, fps: f64) {
        self.fps.set(fps);
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame.get()
    }

    pub fn set_frame(&self, frame: u64) {
        self.frame.set(frame);
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed.get()
    }

    pub fn set_speed(&self, speed: f64) {
        self.speed.set(speed);
    }

    pub fn duration(&self) -> u64 {
        self.duration.get()
    }

    pub fn set_duration(&self, frames: u64) {
        self.duration.set(frames);
    }

    pub fn state(&self) -> PlaybackState {
        self.state.get()
    }

    pub fn set_state(&self, state: PlaybackState) {
        self.state.set(state);
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Time of the current frame in seconds.
    pub fn time(&self) -> f64 {
        self.frames_to_seconds(self.frame() as f64)
    }

    #[inline]
    pub fn frames_to_seconds(&self, frames: f64) -> f64 {
        frames / self.fps()
    }

    /// Nearest whole frame for `seconds`. Negative inputs map to frame zero.
    #[inline]
    pub fn seconds_to_frames(&self, seconds: f64) -> u64 {
        (seconds * self.fps()).round().max(0.0) as u64
    }

    /// Seconds advanced per tick, scaled by speed.
    #[inline]
    pub fn delta_time(&self) -> f64 {
        self.frames_to_seconds(1.0) * self.speed()
    }
}

/// Drives a scheduler one frame at a time.
pub struct PlaybackDriver {
    status: Rc<PlaybackStatus>,
    scene: Option<Rc<dyn Scene>>,
    runner: Threads,
    /// Whether the frame-zero resume already ran.
    started: bool,
    finished: bool,
}

impl PlaybackDriver {
    pub fn new(status: PlaybackStatus, root: impl Task + 'static) -> Self {
        Self {
            status: Rc::new(status),
            scene: None,
            runner: Threads::new(root),
            started: false,
            finished: false,
        }
    }

    /// Run every tick inside `scene`, so `use_scene` and `use_logger` resolve to it.
    pub fn with_scene(mut self, scene: Rc<dyn Scene>) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn status(&self) -> &Rc<PlaybackStatus> {
        &self.status
    }

    pub fn main_thread(&self) -> Option<&Thread> {
        self.runner.main_thread()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Resume the scheduler for the current frame, then advance the frame.
    /// Returns `false` once every thread has finished.
    ///
    /// The first tick resumes frame zero, so a thread that waits `n` frames
    /// finishes on tick `n + 1`. Use [`PlaybackDriver::advance`] to count frame
    /// advances instead.
    pub fn tick(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        self.started = true;
        start_playback(&self.status);
        if let Some(scene) = &self.scene {
            start_scene(scene);
        }

        let step = self.runner.resume();

        let scene_ended = match &self.scene {
            Some(scene) => end_scene(scene),
            None => Ok(()),
        };
        let playback_ended = end_playback(&self.status);
        let step = step?;
        scene_ended?;
        playback_ended?;

        self.status.set_frame(self.status.frame() + 1);
        if matches!(step, Step::Done) {
            self.finished = true;
            log::debug!(
                "playback finished after {} frames",
                self.status.frame()
            );
        }
        Ok(!self.finished)
    }

    /// Move to the next frame and resume every thread on it.
    ///
    /// The first call also runs the frame-zero resume, so after `n` advances
    /// the threads have seen frames `0..=n`.
    pub fn advance(&mut self) -> Result<bool> {
        if !self.started {
            self.tick()?;
        }
        self.tick()
    }

    /// Tick until finished or `max_frames` ticks have run. Returns the ticks run.
    pub fn run_until_done(&mut self, max_frames: u64) -> Result<u64> {
        let mut ticks = 0;
        while ticks < max_frames && !self.finished {
            self.tick()?;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Cancel every thread; further ticks do nothing.
    pub fn cancel(&mut self) {
        self.runner.cancel();
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threading::from_fn;

    #[test]
    fn converts_between_seconds_and_frames() {
        let status = PlaybackStatus::new(60.0);
        status.set_frame(120);
        status.set_speed(2.0);
        assert_eq!(status.frames_to_seconds(120.0), 2.0);
        assert_eq!(status.seconds_to_frames(2.0), 120);
        assert_eq!(status.seconds_to_frames(2.4), 144);
        assert_eq!(status.time(), 2.0);
        assert!((status.delta_time() - 2.0 / 60.0).abs() < 1e-12);
        assert_eq!(status.state(), PlaybackState::Playing);
    }

    #[test]
    fn conversion_ignores_duration() {
        let status = PlaybackStatus::new(30.0);
        status.set_duration(90);
        assert_eq!(status.seconds_to_frames(10.0), 300);
        assert!((status.frames_to_seconds(120.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn driver_advances_frames_until_done() {
        let mut left = 3;
        let root = from_fn(move || {
            left -= 1;
            Ok(if left == 0 { Step::Done } else { Step::Yield })
        });
        let mut driver = PlaybackDriver::new(PlaybackStatus::new(30.0), root);
        assert_eq!(driver.run_until_done(100).unwrap(), 3);
        assert!(driver.is_finished());
        assert_eq!(driver.status().frame(), 3);
        assert!(!driver.tick().unwrap());
    }

    #[test]
    fn first_advance_includes_frame_zero() {
        let resumes = Rc::new(Cell::new(0));
        let counter = resumes.clone();
        let root = from_fn(move || {
            counter.set(counter.get() + 1);
            Ok(Step::Yield)
        });
        let mut driver = PlaybackDriver::new(PlaybackStatus::new(30.0), root);
        assert!(driver.advance().unwrap());
        assert_eq!(resumes.get(), 2);
        assert_eq!(driver.status().frame(), 2);
        assert!(driver.advance().unwrap());
        assert_eq!(resumes.get(), 3);
    }

    #[test]
    fn from_config_validates() {
        let config = MotionConfig {
            fps: 24.0,
            speed: 0.5,
            ..MotionConfig::default()
        };
        let status = PlaybackStatus::from_config(&config).unwrap();
        assert_eq!(status.fps(), 24.0);
        assert_eq!(status.speed(), 0.5);

        let broken = MotionConfig {
            fps: -1.0,
            ..MotionConfig::default()
        };
        assert!(PlaybackStatus::from_config(&broken).is_err());
    }

    #[test]
    fn driver_cancel_stops_ticking() {
        let mut driver =
            PlaybackDriver::new(PlaybackStatus::new(30.0), from_fn(|| Ok(Step::Yield)));
        driver.tick().unwrap();
        driver.cancel();
        assert!(driver.main_thread().unwrap().is_cancelled());
        assert!(!driver.tick().unwrap());
    }
}
