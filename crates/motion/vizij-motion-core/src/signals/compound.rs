//! Signals made of named part signals.
//!
//! A [`CompoundSignal`] packs several scalar signals (for example `x` and `y`)
//! into one value. Reads pack the parts, writes unpack into them, and each
//! part stays usable as a signal of its own.

use std::rc::Rc;

use crate::error::{MotionError, Result};
use crate::signals::signal::{derived, Signal, SignalValue};
use crate::signals::tween::{SignalTween, TweenTarget};
use crate::tweening::interpolation::{lerp_fn, InterpolationFn, Lerp};
use crate::types::Vector2;

type PackFn<T, S> = Rc<dyn Fn(&[S]) -> T>;
type UnpackFn<T, S> = Rc<dyn Fn(&T) -> Vec<S>>;

pub struct CompoundSignal<T, S> {
    parts: Rc<Vec<(String, Signal<S>)>>,
    /// Parts created by this compound are disposed with it.
    owns_parts: bool,
    pack: PackFn<T, S>,
    unpack: UnpackFn<T, S>,
    interpolation: InterpolationFn<T>,
}

pub type Vector2Signal = CompoundSignal<Vector2, f64>;

impl<T, S> Clone for CompoundSignal<T, S> {
    fn clone(&self) -> Self {
        Self {
            parts: self.parts.clone(),
            owns_parts: self.owns_parts,
            pack: self.pack.clone(),
            unpack: self.unpack.clone(),
            interpolation: self.interpolation.clone(),
        }
    }
}

impl<T, S> CompoundSignal<T, S>
where
    T: Clone + 'static,
    S: Clone + Lerp + 'static,
{
    /// Create one owned part signal per key, seeded from `initial`.
    pub fn new(
        keys: &[&str],
        initial: T,
        pack: impl Fn(&[S]) -> T + 'static,
        unpack: impl Fn(&T) -> Vec<S> + 'static,
        interpolation: InterpolationFn<T>,
    ) -> Self {
        let values = unpack(&initial);
        let parts = keys
            .iter()
            .zip(values)
            .map(|(key, value)| (key.to_string(), Signal::new(value).named(*key)))
            .collect();
        Self {
            parts: Rc::new(parts),
            owns_parts: true,
            pack: Rc::new(pack),
            unpack: Rc::new(unpack),
            interpolation,
        }
    }
}

impl<T, S> CompoundSignal<T, S>
where
    T: Clone + 'static,
    S: Clone + 'static,
{
    /// Wrap existing signals. They are left alone on dispose.
    pub fn from_signals(
        parts: Vec<(String, Signal<S>)>,
        pack: impl Fn(&[S]) -> T + 'static,
        unpack: impl Fn(&T) -> Vec<S> + 'static,
        interpolation: InterpolationFn<T>,
    ) -> Self {
        Self {
            parts: Rc::new(parts),
            owns_parts: false,
            pack: Rc::new(pack),
            unpack: Rc::new(unpack),
            interpolation,
        }
    }

    pub fn part(&self, key: &str) -> Option<&Signal<S>> {
        self.parts
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, signal)| signal)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self) -> Result<T> {
        let values = self
            .parts
            .iter()
            .map(|(_, signal)| signal.get())
            .collect::<Result<Vec<S>>>()?;
        Ok((self.pack)(&values))
    }

    /// Literals are unpacked into the parts; a derived value derives every
    /// part from it; `Default` resets every part.
    pub fn set(&self, value: impl Into<SignalValue<T>>) -> &Self {
        match value.into() {
            SignalValue::Literal(value) => {
                for ((_, signal), part) in self.parts.iter().zip((self.unpack)(&value)) {
                    signal.set(part);
                }
            }
            SignalValue::Derived(factory) => {
                for (index, (key, signal)) in self.parts.iter().enumerate() {
                    let factory = factory.clone();
                    let unpack = self.unpack.clone();
                    let key = key.clone();
                    signal.set(derived(move || {
                        let value = factory()?;
                        unpack(&value).into_iter().nth(index).ok_or_else(|| {
                            MotionError::parse(format!("derived value has no part {key}"))
                        })
                    }));
                }
            }
            SignalValue::Default => {
                for (_, signal) in self.parts.iter() {
                    signal.reset();
                }
            }
        }
        self
    }

    pub fn set_fn(&self, factory: impl Fn() -> Result<T> + 'static) -> &Self {
        self.set(derived(factory))
    }

    pub fn reset(&self) -> &Self {
        self.set(SignalValue::Default)
    }

    pub fn save(&self) -> Result<&Self> {
        for (_, signal) in self.parts.iter() {
            signal.save()?;
        }
        Ok(self)
    }

    /// Stored values of every part, unresolved.
    pub fn raw(&self) -> Vec<(String, Option<SignalValue<S>>)> {
        self.parts
            .iter()
            .map(|(key, signal)| (key.clone(), signal.raw()))
            .collect()
    }

    pub fn is_tweening(&self) -> bool {
        self.parts.iter().any(|(_, signal)| signal.is_tweening())
    }

    pub fn dispose(&self) {
        if self.owns_parts {
            for (_, signal) in self.parts.iter() {
                signal.dispose();
            }
        }
    }

    pub fn tween(&self, to: T, seconds: f64) -> SignalTween<CompoundSignal<T, S>> {
        SignalTween::new(self.clone()).to(to, seconds)
    }
}

impl<T, S> CompoundSignal<T, S>
where
    T: Clone + 'static,
    S: Clone + PartialEq + 'static,
{
    pub fn is_initial(&self) -> Result<bool> {
        for (_, signal) in self.parts.iter() {
            if !signal.is_initial()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Vector2Signal {
    pub fn vector2(initial: Vector2) -> Self {
        CompoundSignal::new(
            &["x", "y"],
            initial,
            |values: &[f64]| {
                Vector2::new(
                    values.first().copied().unwrap_or_default(),
                    values.get(1).copied().unwrap_or_default(),
                )
            },
            |value: &Vector2| vec![value.x, value.y],
            lerp_fn::<Vector2>(),
        )
    }

    pub fn x(&self) -> Option<&Signal<f64>> {
        self.part("x")
    }

    pub fn y(&self) -> Option<&Signal<f64>> {
        self.part("y")
    }
}

impl<T, S> TweenTarget for CompoundSignal<T, S>
where
    T: Clone + 'static,
    S: Clone + 'static,
{
    type Value = T;

    fn tween_from(&self) -> Result<T> {
        self.get()
    }

    fn interpolation(&self) -> InterpolationFn<T> {
        self.interpolation.clone()
    }

    fn set_tweened(&self, value: T) -> Result<()> {
        for ((_, signal), part) in self.parts.iter().zip((self.unpack)(&value)) {
            signal.set_tweened(part)?;
        }
        Ok(())
    }

    fn finish_tween(&self, value: T) {
        for (_, signal) in self.parts.iter() {
            signal.set_tweening(false);
        }
        self.set(value);
    }

    fn set_tweening(&self, tweening: bool) {
        for (_, signal) in self.parts.iter() {
            signal.set_tweening(tweening);
        }
    }
}
