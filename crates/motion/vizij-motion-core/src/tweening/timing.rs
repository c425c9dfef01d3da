//! Timing (easing) functions.
//!
//! Every function maps a progress in `[0, 1]` to an eased progress with
//! `f(0) == 0` and `f(1) == 1`. Use [`Timing::between`] to remap the eased
//! progress into a custom numeric range. The `create_*` constructors return
//! configured variants of the parametrized families.

use std::f64::consts::PI;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::tweening::helpers::map;

/// Shared timing function handle.
pub type TimingFn = Rc<dyn Fn(f64) -> f64>;

/// Range remapping for any timing function.
pub trait Timing: Fn(f64) -> f64 {
    #[inline]
    fn between(&self, value: f64, from: f64, to: f64) -> f64 {
        map(from, to, self(value))
    }
}

impl<F: Fn(f64) -> f64 + ?Sized> Timing for F {}

const BACK_OVERSHOOT: f64 = 1.70158;
const BACK_IN_OUT_SCALE: f64 = 1.525;
const ELASTIC_BOUNCINESS: f64 = 2.094395;
const ELASTIC_IN_OUT_BOUNCINESS: f64 = 1.39626;
const BOUNCE_STRENGTH: f64 = 7.5625;
const BOUNCE_DIVISOR: f64 = 2.75;

#[inline]
pub fn sin(value: f64) -> f64 {
    (value.sin() + 1.0) / 2.0
}

#[inline]
pub fn cos(value: f64) -> f64 {
    (value.cos() + 1.0) / 2.0
}

#[inline]
pub fn linear(value: f64) -> f64 {
    value
}

#[inline]
pub fn ease_in_sine(value: f64) -> f64 {
    1.0 - (value * PI / 2.0).cos()
}

#[inline]
pub fn ease_out_sine(value: f64) -> f64 {
    (value * PI / 2.0).sin()
}

#[inline]
pub fn ease_in_out_sine(value: f64) -> f64 {
    -((PI * value).cos() - 1.0) / 2.0
}

#[inline]
pub fn ease_in_quad(value: f64) -> f64 {
    value * value
}

#[inline]
pub fn ease_out_quad(value: f64) -> f64 {
    1.0 - (1.0 - value) * (1.0 - value)
}

#[inline]
pub fn ease_in_out_quad(value: f64) -> f64 {
    if value < 0.5 {
        2.0 * value * value
    } else {
        1.0 - (-2.0 * value + 2.0).powi(2) / 2.0
    }
}

#[inline]
pub fn ease_in_cubic(value: f64) -> f64 {
    value * value * value
}

#[inline]
pub fn ease_out_cubic(value: f64) -> f64 {
    1.0 - (1.0 - value).powi(3)
}

#[inline]
pub fn ease_in_out_cubic(value: f64) -> f64 {
    if value < 0.5 {
        4.0 * value * value * value
    } else {
        1.0 - (-2.0 * value + 2.0).powi(3) / 2.0
    }
}

#[inline]
pub fn ease_in_quart(value: f64) -> f64 {
    value.powi(4)
}

#[inline]
pub fn ease_out_quart(value: f64) -> f64 {
    1.0 - (1.0 - value).powi(4)
}

#[inline]
pub fn ease_in_out_quart(value: f64) -> f64 {
    if value < 0.5 {
        8.0 * value.powi(4)
    } else {
        1.0 - (-2.0 * value + 2.0).powi(4) / 2.0
    }
}

#[inline]
pub fn ease_in_quint(value: f64) -> f64 {
    value.powi(5)
}

#[inline]
pub fn ease_out_quint(value: f64) -> f64 {
    1.0 - (1.0 - value).powi(5)
}

#[inline]
pub fn ease_in_out_quint(value: f64) -> f64 {
    if value < 0.5 {
        16.0 * value.powi(5)
    } else {
        1.0 - (-2.0 * value + 2.0).powi(5) / 2.0
    }
}

pub fn ease_in_expo(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else if value == 1.0 {
        1.0
    } else {
        2f64.powf(10.0 * value - 10.0)
    }
}

pub fn ease_out_expo(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else if value == 1.0 {
        1.0
    } else {
        1.0 - 2f64.powf(-10.0 * value)
    }
}

pub fn ease_in_out_expo(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else if value == 1.0 {
        1.0
    } else if value < 0.5 {
        2f64.powf(20.0 * value - 10.0) / 2.0
    } else {
        (2.0 - 2f64.powf(-20.0 * value + 10.0)) / 2.0
    }
}

#[inline]
pub fn ease_in_circ(value: f64) -> f64 {
    1.0 - (1.0 - value * value).max(0.0).sqrt()
}

#[inline]
pub fn ease_out_circ(value: f64) -> f64 {
    (1.0 - (value - 1.0).powi(2)).max(0.0).sqrt()
}

pub fn ease_in_out_circ(value: f64) -> f64 {
    if value < 0.5 {
        (1.0 - (1.0 - (2.0 * value).powi(2)).max(0.0).sqrt()) / 2.0
    } else {
        ((1.0 - (-2.0 * value + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
    }
}

pub fn create_ease_in_back(overshoot: f64) -> impl Fn(f64) -> f64 + Clone {
    move |value| (overshoot + 1.0) * value.powi(3) - overshoot * value * value
}

pub fn create_ease_out_back(overshoot: f64) -> impl Fn(f64) -> f64 + Clone {
    move |value| {
        1.0 + (overshoot + 1.0) * (value - 1.0).powi(3) + overshoot * (value - 1.0).powi(2)
    }
}

pub fn create_ease_in_out_back(overshoot: f64, scale: f64) -> impl Fn(f64) -> f64 + Clone {
    move |value| {
        let s = overshoot * scale;
        if value < 0.5 {
            ((2.0 * value).powi(2) * ((s + 1.0) * 2.0 * value - s)) / 2.0
        } else {
            ((2.0 * value - 2.0).powi(2) * ((s + 1.0) * (value * 2.0 - 2.0) + s) + 2.0) / 2.0
        }
    }
}

pub fn ease_in_back(value: f64) -> f64 {
    create_ease_in_back(BACK_OVERSHOOT)(value)
}

pub fn ease_out_back(value: f64) -> f64 {
    create_ease_out_back(BACK_OVERSHOOT)(value)
}

pub fn ease_in_out_back(value: f64) -> f64 {
    create_ease_in_out_back(BACK_OVERSHOOT, BACK_IN_OUT_SCALE)(value)
}

pub fn create_ease_in_elastic(bounciness: f64) -> impl Fn(f64) -> f64 + Clone {
    move |value| {
        if value == 0.0 || value == 1.0 {
            return value;
        }
        -(2f64.powf(10.0 * value - 10.0)) * ((value * 10.0 - 10.75) * bounciness).sin()
    }
}

pub fn create_ease_out_elastic(bounciness: f64) -> impl Fn(f64) -> f64 + Clone {
    move |value| {
        if value == 0.0 || value == 1.0 {
            return value;
        }
        2f64.powf(-10.0 * value) * ((value * 10.0 - 0.75) * bounciness).sin() + 1.0
    }
}

pub fn create_ease_in_out_elastic(bounciness: f64) -> impl Fn(f64) -> f64 + Clone {
    move |value| {
        if value == 0.0 || value == 1.0 {
            return value;
        }
        if value < 0.5 {
            -(2f64.powf(20.0 * value - 10.0) * ((20.0 * value - 11.125) * bounciness).sin()) / 2.0
        } else {
            2f64.powf(-20.0 * value + 10.0) * ((20.0 * value - 11.125) * bounciness).sin() / 2.0
                + 1.0
        }
    }
}

pub fn ease_in_elastic(value: f64) -> f64 {
    create_ease_in_elastic(ELASTIC_BOUNCINESS)(value)
}

pub fn ease_out_elastic(value: f64) -> f64 {
    create_ease_out_elastic(ELASTIC_BOUNCINESS)(value)
}

pub fn ease_in_out_elastic(value: f64) -> f64 {
    create_ease_in_out_elastic(ELASTIC_IN_OUT_BOUNCINESS)(value)
}

fn bounce_out(value: f64, strength: f64, divisor: f64) -> f64 {
    if value < 1.0 / divisor {
        strength * value * value
    } else if value < 2.0 / divisor {
        let v = value - 1.5 / divisor;
        strength * v * v + 0.75
    } else if value < 2.5 / divisor {
        let v = value - 2.25 / divisor;
        strength * v * v + 0.9375
    } else {
        let v = value - 2.625 / divisor;
        strength * v * v + 0.984375
    }
}

/// `strength` scales each bounce parabola; `divisor` controls where the bounces land.
pub fn create_ease_out_bounce(strength: f64, divisor: f64) -> impl Fn(f64) -> f64 + Clone {
    move |value| bounce_out(value, strength, divisor)
}

pub fn create_ease_in_bounce(strength: f64, divisor: f64) -> impl Fn(f64) -> f64 + Clone {
    move |value| 1.0 - bounce_out(1.0 - value, strength, divisor)
}

pub fn create_ease_in_out_bounce(strength: f64, divisor: f64) -> impl Fn(f64) -> f64 + Clone {
    move |value| {
        if value < 0.5 {
            (1.0 - bounce_out(1.0 - 2.0 * value, strength, divisor)) / 2.0
        } else {
            (1.0 + bounce_out(2.0 * value - 1.0, strength, divisor)) / 2.0
        }
    }
}

pub fn ease_in_bounce(value: f64) -> f64 {
    create_ease_in_bounce(BOUNCE_STRENGTH, BOUNCE_DIVISOR)(value)
}

pub fn ease_out_bounce(value: f64) -> f64 {
    create_ease_out_bounce(BOUNCE_STRENGTH, BOUNCE_DIVISOR)(value)
}

pub fn ease_in_out_bounce(value: f64) -> f64 {
    create_ease_in_out_bounce(BOUNCE_STRENGTH, BOUNCE_DIVISOR)(value)
}

/// Named easing, for picking a timing function from configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    #[default]
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
    EaseInBounce,
    EaseOutBounce,
    EaseInOutBounce,
}

impl Easing {
    pub const ALL: [Easing; 31] = [
        Easing::Linear,
        Easing::EaseInSine,
        Easing::EaseOutSine,
        Easing::EaseInOutSine,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInQuint,
        Easing::EaseOutQuint,
        Easing::EaseInOutQuint,
        Easing::EaseInExpo,
        Easing::EaseOutExpo,
        Easing::EaseInOutExpo,
        Easing::EaseInCirc,
        Easing::EaseOutCirc,
        Easing::EaseInOutCirc,
        Easing::EaseInBack,
        Easing::EaseOutBack,
        Easing::EaseInOutBack,
        Easing::EaseInElastic,
        Easing::EaseOutElastic,
        Easing::EaseInOutElastic,
        Easing::EaseInBounce,
        Easing::EaseOutBounce,
        Easing::EaseInOutBounce,
    ];

    pub fn function(self) -> fn(f64) -> f64 {
        match self {
            Easing::Linear => linear,
            Easing::EaseInSine => ease_in_sine,
            Easing::EaseOutSine => ease_out_sine,
            Easing::EaseInOutSine => ease_in_out_sine,
            Easing::EaseInQuad => ease_in_quad,
            Easing::EaseOutQuad => ease_out_quad,
            Easing::EaseInOutQuad => ease_in_out_quad,
            Easing::EaseInCubic => ease_in_cubic,
            Easing::EaseOutCubic => ease_out_cubic,
            Easing::EaseInOutCubic => ease_in_out_cubic,
            Easing::EaseInQuart => ease_in_quart,
            Easing::EaseOutQuart => ease_out_quart,
            Easing::EaseInOutQuart => ease_in_out_quart,
            Easing::EaseInQuint => ease_in_quint,
            Easing::EaseOutQuint => ease_out_quint,
            Easing::EaseInOutQuint => ease_in_out_quint,
            Easing::EaseInExpo => ease_in_expo,
            Easing::EaseOutExpo => ease_out_expo,
            Easing::EaseInOutExpo => ease_in_out_expo,
            Easing::EaseInCirc => ease_in_circ,
            Easing::EaseOutCirc => ease_out_circ,
            Easing::EaseInOutCirc => ease_in_out_circ,
            Easing::EaseInBack => ease_in_back,
            Easing::EaseOutBack => ease_out_back,
            Easing::EaseInOutBack => ease_in_out_back,
            Easing::EaseInElastic => ease_in_elastic,
            Easing::EaseOutElastic => ease_out_elastic,
            Easing::EaseInOutElastic => ease_in_out_elastic,
            Easing::EaseInBounce => ease_in_bounce,
            Easing::EaseOutBounce => ease_out_bounce,
            Easing::EaseInOutBounce => ease_in_out_bounce,
        }
    }

    #[inline]
    pub fn apply(self, value: f64) -> f64 {
        (self.function())(value)
    }

    pub fn timing_fn(self) -> TimingFn {
        Rc::new(self.function())
    }
}
