//! Reactive value cells.
//!
//! A [`Signal`] stores either a literal or a derived closure. Reads resolve
//! the stored value through the optional parser, cache it, and register the
//! signal as a dependency of whatever is collecting. Writes mark the signal
//! dirty so dependents recompute on their next read.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{MotionError, Result};
use crate::signals::dependency::DependencyContext;
use crate::signals::tween::{SignalTween, TweenTarget};
use crate::tweening::interpolation::{lerp_fn, InterpolationFn, Lerp};

type ParserFn<T> = Rc<dyn Fn(T) -> Result<T>>;
type DerivedFn<T> = Rc<dyn Fn() -> Result<T>>;

/// What a signal stores.
pub enum SignalValue<T> {
    Literal(T),
    /// Recomputed from other signals on every dirty read.
    Derived(DerivedFn<T>),
    /// Resets the signal to its initial value when set.
    Default,
}

/// Wrap a closure as a derived signal value.
pub fn derived<T>(factory: impl Fn() -> Result<T> + 'static) -> SignalValue<T> {
    SignalValue::Derived(Rc::new(factory))
}

impl<T> From<T> for SignalValue<T> {
    fn from(value: T) -> Self {
        SignalValue::Literal(value)
    }
}

impl<T: Clone> Clone for SignalValue<T> {
    fn clone(&self) -> Self {
        match self {
            SignalValue::Literal(value) => SignalValue::Literal(value.clone()),
            SignalValue::Derived(factory) => SignalValue::Derived(factory.clone()),
            SignalValue::Default => SignalValue::Default,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SignalValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            SignalValue::Derived(_) => f.write_str("Derived(..)"),
            SignalValue::Default => f.write_str("Default"),
        }
    }
}

impl<T> SignalValue<T> {
    pub fn is_derived(&self) -> bool {
        matches!(self, SignalValue::Derived(_))
    }

    pub fn as_literal(&self) -> Option<&T> {
        match self {
            SignalValue::Literal(value) => Some(value),
            _ => None,
        }
    }
}

struct SignalState<T> {
    initial: Option<SignalValue<T>>,
    current: Option<SignalValue<T>>,
    last: Option<T>,
    disposed: bool,
}

struct SignalInner<T> {
    context: DependencyContext,
    state: RefCell<SignalState<T>>,
    interpolation: RefCell<InterpolationFn<T>>,
    parser: RefCell<Option<ParserFn<T>>>,
    tweening: Cell<bool>,
}

/// Shared handle to a reactive value cell. Clones observe the same cell.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Lerp + 'static> Signal<T> {
    pub fn new(initial: impl Into<SignalValue<T>>) -> Self {
        Self::with_interpolation(initial, lerp_fn::<T>())
    }
}

impl<T: Clone + 'static> Signal<T> {
    pub fn with_interpolation(
        initial: impl Into<SignalValue<T>>,
        interpolation: InterpolationFn<T>,
    ) -> Self {
        let initial = initial.into();
        Self {
            inner: Rc::new(SignalInner {
                context: DependencyContext::new("signal"),
                state: RefCell::new(SignalState {
                    current: Some(initial.clone()),
                    initial: Some(initial),
                    last: None,
                    disposed: false,
                }),
                interpolation: RefCell::new(interpolation),
                parser: RefCell::new(None),
                tweening: Cell::new(false),
            }),
        }
    }

    /// Label used in diagnostics and errors.
    pub fn named(self, name: impl Into<String>) -> Self {
        self.inner.context.set_label(name);
        self
    }

    /// Coerce every resolved value. Parse failures surface from [`Signal::get`].
    pub fn with_parser(self, parser: impl Fn(T) -> Result<T> + 'static) -> Self {
        *self.inner.parser.borrow_mut() = Some(Rc::new(parser));
        self.inner.context.mark_dirty();
        self
    }

    pub fn name(&self) -> String {
        self.inner.context.label()
    }

    pub fn context(&self) -> &DependencyContext {
        &self.inner.context
    }

    pub fn interpolation(&self) -> InterpolationFn<T> {
        self.inner.interpolation.borrow().clone()
    }

    pub fn set_interpolation(&self, interpolation: InterpolationFn<T>) {
        *self.inner.interpolation.borrow_mut() = interpolation;
    }

    /// Resolve the current value.
    ///
    /// While a tween runs, the last tweened value is returned as is.
    pub fn get(&self) -> Result<T> {
        let context = &self.inner.context;
        if self.inner.state.borrow().disposed {
            return Err(MotionError::Disposed { name: self.name() });
        }

        let cached = self.inner.state.borrow().last.clone();
        let value = match cached {
            Some(last) if self.inner.tweening.get() || !context.is_dirty() => last,
            _ => {
                let current = self.inner.state.borrow().current.clone();
                let value = self.resolve(current)?;
                self.inner.state.borrow_mut().last = Some(value.clone());
                value
            }
        };

        context.reset_dirty();
        context.collect();
        Ok(value)
    }

    fn resolve(&self, value: Option<SignalValue<T>>) -> Result<T> {
        match value {
            Some(SignalValue::Literal(value)) => {
                self.inner.context.clear_dependencies();
                self.parse(value)
            }
            Some(SignalValue::Derived(factory)) => {
                let context = &self.inner.context;
                context.start_collecting()?;
                context.clear_dependencies();
                let result = factory();
                context.finish_collecting();
                self.parse(result?)
            }
            Some(SignalValue::Default) | None => {
                let initial = self.inner.state.borrow().initial.clone();
                match initial {
                    Some(SignalValue::Default) | None => Err(MotionError::parse(format!(
                        "{} has no initial value",
                        self.name()
                    ))),
                    initial => self.resolve(initial),
                }
            }
        }
    }

    fn parse(&self, value: T) -> Result<T> {
        let parser = self.inner.parser.borrow().clone();
        match parser {
            Some(parser) => parser(value),
            None => Ok(value),
        }
    }

    /// Store a literal, a derived closure, or [`SignalValue::Default`].
    pub fn set(&self, value: impl Into<SignalValue<T>>) -> &Self {
        let value = match value.into() {
            SignalValue::Default => self.inner.state.borrow().initial.clone(),
            value => Some(value),
        };
        self.inner.state.borrow_mut().current = value;
        self.inner.context.mark_dirty();
        self
    }

    pub fn set_fn(&self, factory: impl Fn() -> Result<T> + 'static) -> &Self {
        self.set(derived(factory))
    }

    pub fn reset(&self) -> &Self {
        self.set(SignalValue::Default)
    }

    /// Adopt the resolved value as the new initial value.
    pub fn save(&self) -> Result<&Self> {
        let value = self.get()?;
        self.inner.state.borrow_mut().initial = Some(SignalValue::Literal(value));
        Ok(self)
    }

    /// The initial value, unresolved.
    pub fn initial(&self) -> Option<SignalValue<T>> {
        self.inner.state.borrow().initial.clone()
    }

    /// The stored value, unresolved.
    pub fn raw(&self) -> Option<SignalValue<T>> {
        self.inner.state.borrow().current.clone()
    }

    #[inline]
    pub fn is_tweening(&self) -> bool {
        self.inner.tweening.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.borrow().disposed
    }

    /// Release stored values and leave the dependency graph. Later reads
    /// return [`MotionError::Disposed`].
    pub fn dispose(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            state.initial = None;
            state.current = None;
            state.last = None;
            state.disposed = true;
        }
        self.inner.tweening.set(false);
        self.inner.context.dispose();
    }

    /// Animate towards `to` over `seconds`.
    pub fn tween(&self, to: T, seconds: f64) -> SignalTween<Signal<T>> {
        SignalTween::new(self.clone()).to(to, seconds)
    }

    pub(crate) fn set_tweened(&self, value: T) -> Result<()> {
        let value = self.parse(value)?;
        {
            let mut state = self.inner.state.borrow_mut();
            state.current = Some(SignalValue::Literal(value.clone()));
            state.last = Some(value);
        }
        self.inner.context.mark_dirty();
        Ok(())
    }

    pub(crate) fn set_tweening(&self, tweening: bool) {
        self.inner.tweening.set(tweening);
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Whether the resolved value equals the resolved initial value.
    pub fn is_initial(&self) -> Result<bool> {
        let initial = match self.initial() {
            Some(SignalValue::Literal(value)) => self.parse(value)?,
            Some(SignalValue::Derived(factory)) => self.parse(factory()?)?,
            Some(SignalValue::Default) | None => return Ok(false),
        };
        Ok(self.get()? == initial)
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Signal")
            .field("name", &self.inner.context.label())
            .field("current", &state.current)
            .field("last", &state.last)
            .field("tweening", &self.inner.tweening.get())
            .finish()
    }
}

impl<T: Clone + 'static> TweenTarget for Signal<T> {
    type Value = T;

    fn tween_from(&self) -> Result<T> {
        self.get()
    }

    fn interpolation(&self) -> InterpolationFn<T> {
        Signal::interpolation(self)
    }

    fn set_tweened(&self, value: T) -> Result<()> {
        Signal::set_tweened(self, value)
    }

    fn finish_tween(&self, value: T) {
        self.inner.tweening.set(false);
        self.set(value);
    }

    fn set_tweening(&self, tweening: bool) {
        Signal::set_tweening(self, tweening);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_round_trip_goes_through_parser() {
        let signal = Signal::new(1.0).with_parser(|value: f64| Ok(value.round()));
        signal.set(2.6);
        assert_eq!(signal.get().unwrap(), 3.0);
        assert!(matches!(signal.raw(), Some(SignalValue::Literal(v)) if v == 2.6));
    }

    #[test]
    fn default_restores_initial() {
        let signal = Signal::new(5.0);
        signal.set(9.0);
        signal.set(SignalValue::Default);
        assert_eq!(signal.get().unwrap(), 5.0);
        assert!(signal.is_initial().unwrap());
    }

    #[test]
    fn save_moves_the_initial_value() {
        let signal = Signal::new(0.0);
        signal.set(4.0).save().unwrap();
        signal.set(7.0).reset();
        assert_eq!(signal.get().unwrap(), 4.0);
        assert!(matches!(signal.initial(), Some(SignalValue::Literal(v)) if v == 4.0));
    }

    #[test]
    fn parser_errors_propagate_and_retry() {
        let signal = Signal::new(1.0).with_parser(|value: f64| {
            if value < 0.0 {
                Err(MotionError::parse("negative"))
            } else {
                Ok(value)
            }
        });
        signal.set(-1.0);
        assert!(matches!(signal.get(), Err(MotionError::Parse { .. })));
        signal.set(2.0);
        assert_eq!(signal.get().unwrap(), 2.0);
    }

    #[test]
    fn derived_values_follow_their_sources() {
        let a = Signal::new(1.0);
        let b = Signal::new(2.0);
        let sum = Signal::new(0.0);
        let (ra, rb) = (a.clone(), b.clone());
        sum.set_fn(move || Ok(ra.get()? + rb.get()?));
        assert_eq!(sum.get().unwrap(), 3.0);
        assert_eq!(sum.context().dependency_count(), 2);
        a.set(10.0);
        assert_eq!(sum.get().unwrap(), 12.0);
        sum.set(1.0);
        assert_eq!(sum.get().unwrap(), 1.0);
        assert_eq!(sum.context().dependency_count(), 0);
    }

    #[test]
    fn self_reference_is_circular() {
        let signal = Signal::new(0.0).named("loop");
        let inner = signal.clone();
        signal.set_fn(move || inner.get());
        assert!(matches!(
            signal.get(),
            Err(MotionError::CircularDependency { .. })
        ));
    }

    #[test]
    fn disposed_signals_report_disposed() {
        let signal = Signal::new(String::from("text")).named("label");
        signal.dispose();
        assert!(signal.is_disposed());
        assert_eq!(
            signal.get(),
            Err(MotionError::Disposed {
                name: "label".to_string()
            })
        );
        assert!(signal.raw().is_none());
    }
}
