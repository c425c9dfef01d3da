//! Memoized values derived from other signals.
//!
//! A [`Computed`] recomputes only after one of the values it read last time
//! changed. Factory errors and cycles are logged through the active logger
//! and the last good value is kept, so a broken computation does not fail
//! every read.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::context::use_logger;
use crate::error::Result;
use crate::logging::LogPayload;
use crate::signals::dependency::DependencyContext;

struct ComputedInner<T> {
    context: DependencyContext,
    factory: Box<dyn Fn() -> Result<T>>,
    last: RefCell<Option<T>>,
    disposed: Cell<bool>,
}

/// Shared handle to a memoized computation.
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Computed<T> {
    pub fn new(factory: impl Fn() -> Result<T> + 'static) -> Self {
        Self {
            inner: Rc::new(ComputedInner {
                context: DependencyContext::new("computed"),
                factory: Box::new(factory),
                last: RefCell::new(None),
                disposed: Cell::new(false),
            }),
        }
    }

    pub fn named(self, name: impl Into<String>) -> Self {
        self.inner.context.set_label(name);
        self
    }

    pub fn context(&self) -> &DependencyContext {
        &self.inner.context
    }

    /// The memoized value, recomputed first if a dependency changed.
    ///
    /// `None` until a computation succeeded, and after [`Computed::dispose`].
    pub fn get(&self) -> Option<T> {
        if self.inner.disposed.get() {
            return None;
        }
        let context = &self.inner.context;
        if context.is_dirty() || self.inner.last.borrow().is_none() {
            self.recompute();
        }
        context.reset_dirty();
        context.collect();
        self.inner.last.borrow().clone()
    }

    fn recompute(&self) {
        let context = &self.inner.context;
        if let Err(err) = context.start_collecting() {
            use_logger().error(
                LogPayload::new(err.to_string()).with_remarks(format!(
                    "{} read itself while computing; keeping the last value.",
                    context.label()
                )),
            );
            return;
        }
        context.clear_dependencies();
        let result = (self.inner.factory)();
        context.finish_collecting();

        match result {
            Ok(value) => *self.inner.last.borrow_mut() = Some(value),
            Err(err) => use_logger().error(
                LogPayload::new(format!("Error in {}: {err}", context.label()))
                    .with_remarks(format!("category: {}", err.category())),
            ),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.inner.last.borrow_mut().take();
        self.inner.context.dispose();
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("name", &self.inner.context.label())
            .field("last", &self.inner.last.borrow())
            .field("dirty", &self.inner.context.is_dirty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{end_scene, start_scene, BasicScene, Scene};
    use crate::error::MotionError;
    use crate::logging::Logger;
    use crate::signals::Signal;

    #[test]
    fn recomputes_only_after_a_dependency_changed() {
        let a = Signal::new(1.0);
        let b = Signal::new(2.0);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let (ra, rb) = (a.clone(), b.clone());
        let sum = Computed::new(move || {
            counter.set(counter.get() + 1);
            Ok(ra.get()? + rb.get()?)
        });

        assert_eq!(sum.get(), Some(3.0));
        assert_eq!(sum.get(), Some(3.0));
        assert_eq!(calls.get(), 1);

        a.set(5.0);
        assert_eq!(sum.get(), Some(7.0));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn chains_of_computed_values_propagate() {
        let base = Signal::new(2.0);
        let source = base.clone();
        let doubled = Computed::new(move || Ok(source.get()? * 2.0));
        let inner = doubled.clone();
        let quadrupled = Computed::new(move || {
            inner
                .get()
                .map(|value| value * 2.0)
                .ok_or_else(|| MotionError::parse("missing"))
        });
        assert_eq!(quadrupled.get(), Some(8.0));
        base.set(3.0);
        assert_eq!(quadrupled.get(), Some(12.0));
    }

    #[test]
    fn factory_errors_keep_last_value_and_log() {
        let logger = Rc::new(Logger::new());
        let scene: Rc<dyn Scene> = Rc::new(BasicScene::with_logger("test", logger.clone()));
        start_scene(&scene);

        let input = Signal::new(1.0);
        let source = input.clone();
        let checked = Computed::new(move || {
            let value = source.get()?;
            if value < 0.0 {
                return Err(MotionError::parse("negative"));
            }
            Ok(value)
        });
        assert_eq!(checked.get(), Some(1.0));
        input.set(-1.0);
        assert_eq!(checked.get(), Some(1.0));
        assert_eq!(checked.get(), Some(1.0));
        input.set(4.0);
        assert_eq!(checked.get(), Some(4.0));

        end_scene(&scene).unwrap();
        assert_eq!(logger.history().len(), 1);
    }

    #[test]
    fn dispose_clears_the_value() {
        let computed = Computed::new(|| Ok(1));
        assert_eq!(computed.get(), Some(1));
        computed.dispose();
        assert!(computed.is_disposed());
        assert_eq!(computed.get(), None);
    }
}
