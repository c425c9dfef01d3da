//! Reactive signals.
//!
//! - [`Signal`]: a value cell storing a literal or a derived closure
//! - [`Computed`]: a memoized derivation that logs instead of failing
//! - [`CompoundSignal`]: a value packed from named part signals
//! - [`SignalTween`]: the chainable animation task returned by `tween`
//!
//! All of them track reads through a [`DependencyContext`].

pub mod compound;
pub mod computed;
pub mod dependency;
pub mod signal;
pub mod tween;

pub use compound::{CompoundSignal, Vector2Signal};
pub use computed::Computed;
pub use dependency::{consume_promises, has_promises, DependencyContext, PromiseHandle};
pub use signal::{derived, Signal, SignalValue};
pub use tween::{SignalTween, TweenTarget};
