//! Interpolation, timing functions and time based animation tasks.

pub mod helpers;
pub mod interpolation;
pub mod spring;
pub mod timing;
pub mod tween;

pub use helpers::{arc_lerp, clamp, clamp_remap, map, remap};
pub use interpolation::{bool_lerp, deep_lerp, lerp_fn, text_lerp, InterpolationFn, Lerp};
pub use spring::{
    make_spring, spring, Spring, SpringTask, BEAT_SPRING, BOUNCE_SPRING, JUMP_SPRING,
    PLOP_SPRING, SMOOTH_SPRING, STRIKE_SPRING, SWING_SPRING,
};
pub use timing::{Easing, Timing, TimingFn};
pub use tween::{tween, Tween};
