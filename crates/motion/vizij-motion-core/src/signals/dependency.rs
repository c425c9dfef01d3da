//! Dependency tracking for reactive reads.
//!
//! Every signal and computed value owns a [`DependencyContext`]. While a
//! context is collecting (it sits on the thread local collection stack), any
//! other context that gets read registers itself as a dependency: raising the
//! dependency's flag raises the collector's flag too. Recomputation is pull
//! based, a dirty context only recomputes on its next read.
//!
//! Futures collected with [`DependencyContext::collect_promise`] let async
//! values take part in synchronous reads. Their placeholder is returned until
//! [`consume_promises`] drives them, after which the owner is marked dirty.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use crate::context::use_logger;
use crate::error::{MotionError, Result};
use crate::events::{FlagDispatcher, FlagSubscribable, Subscription};
use crate::logging::LogPayload;

struct ContextInner {
    event: FlagDispatcher,
    dependencies: RefCell<Vec<(FlagDispatcher, Subscription)>>,
    label: RefCell<String>,
}

/// Bookkeeping for one reactive value.
#[derive(Clone)]
pub struct DependencyContext {
    inner: Rc<ContextInner>,
}

thread_local! {
    static COLLECTION_STACK: RefCell<Vec<Rc<ContextInner>>> = const { RefCell::new(Vec::new()) };
    static PROMISES: RefCell<Vec<LocalBoxFuture<'static, ()>>> = const { RefCell::new(Vec::new()) };
}

impl Default for DependencyContext {
    fn default() -> Self {
        Self::new("context")
    }
}

impl DependencyContext {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                event: FlagDispatcher::new(),
                dependencies: RefCell::new(Vec::new()),
                label: RefCell::new(label.into()),
            }),
        }
    }

    pub fn label(&self) -> String {
        self.inner.label.borrow().clone()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        *self.inner.label.borrow_mut() = label.into();
    }

    /// Read-only view of the dirty flag, for outside observers.
    pub fn subscribable(&self) -> FlagSubscribable {
        self.inner.event.subscribable()
    }

    /// Become the active collector.
    ///
    /// Fails if this context is already collecting, which means the value is
    /// being read from inside its own computation.
    pub fn start_collecting(&self) -> Result<()> {
        COLLECTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|entry| Rc::ptr_eq(entry, &self.inner)) {
                return Err(MotionError::CircularDependency {
                    context: self.label(),
                });
            }
            stack.push(self.inner.clone());
            Ok(())
        })
    }

    /// Leave the collection stack.
    ///
    /// Finishing a context that is not on top leaves the other collectors in
    /// place and logs an error.
    pub fn finish_collecting(&self) {
        let in_order = COLLECTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.last().is_some_and(|top| Rc::ptr_eq(top, &self.inner)) {
                stack.pop();
                return true;
            }
            stack.retain(|entry| !Rc::ptr_eq(entry, &self.inner));
            false
        });
        if !in_order {
            use_logger().error(
                LogPayload::new(format!(
                    "Collection stack out of order while finishing {}",
                    self.label()
                ))
                .with_remarks("Another context started collecting and never finished."),
            );
        }
    }

    /// Whether this context is anywhere on the collection stack.
    pub fn is_collecting(&self) -> bool {
        COLLECTION_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|entry| Rc::ptr_eq(entry, &self.inner))
        })
    }

    /// Register this context as a dependency of the active collector, if any.
    pub fn collect(&self) {
        let Some(collector) = COLLECTION_STACK.with(|stack| stack.borrow().last().cloned()) else {
            return;
        };
        if Rc::ptr_eq(&collector, &self.inner) {
            return;
        }
        let mut dependencies = collector.dependencies.borrow_mut();
        if dependencies
            .iter()
            .any(|(event, _)| event.ptr_eq(&self.inner.event))
        {
            return;
        }
        let dependent: Weak<ContextInner> = Rc::downgrade(&collector);
        let subscription = self.inner.event.subscribe(move || {
            if let Some(dependent) = dependent.upgrade() {
                dependent.event.raise();
            }
        });
        dependencies.push((self.inner.event.clone(), subscription));
    }

    /// Flag the value as stale and notify dependents. Idempotent until reset.
    #[inline]
    pub fn mark_dirty(&self) {
        self.inner.event.raise();
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.inner.event.is_raised()
    }

    #[inline]
    pub fn reset_dirty(&self) {
        self.inner.event.reset();
    }

    /// Unsubscribe from every dependency recorded by the previous computation.
    pub fn clear_dependencies(&self) {
        let dependencies = std::mem::take(&mut *self.inner.dependencies.borrow_mut());
        drop(dependencies);
    }

    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.borrow().len()
    }

    /// Detach from the graph in both directions.
    pub fn dispose(&self) {
        self.clear_dependencies();
        self.inner.event.clear();
    }

    pub fn ptr_eq(&self, other: &DependencyContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Track `future` and return a handle holding `placeholder` until it
    /// resolves. Resolution marks this context dirty.
    pub fn collect_promise<T, F>(&self, future: F, placeholder: T) -> PromiseHandle<T>
    where
        T: 'static,
        F: Future<Output = T> + 'static,
    {
        let handle = PromiseHandle {
            value: Rc::new(RefCell::new(placeholder)),
            resolved: Rc::new(Cell::new(false)),
        };
        let value = handle.value.clone();
        let resolved = handle.resolved.clone();
        let owner: Weak<ContextInner> = Rc::downgrade(&self.inner);
        let pending = async move {
            let output = future.await;
            *value.borrow_mut() = output;
            resolved.set(true);
            if let Some(owner) = owner.upgrade() {
                owner.event.raise();
            }
        }
        .boxed_local();
        PROMISES.with(|promises| promises.borrow_mut().push(pending));
        handle
    }

    /// Drive every outstanding promise, including ones registered while
    /// draining, and yield this context back.
    pub async fn to_promise(&self) -> DependencyContext {
        while has_promises() {
            consume_promises().await;
        }
        self.clone()
    }
}

impl fmt::Debug for DependencyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyContext")
            .field("label", &self.inner.label.borrow())
            .field("dirty", &self.is_dirty())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}

/// Whether any collected promise has not been driven yet.
pub fn has_promises() -> bool {
    PROMISES.with(|promises| !promises.borrow().is_empty())
}

/// Await the promises collected so far, in registration order. Returns how
/// many were resolved.
pub async fn consume_promises() -> usize {
    let pending = PROMISES.with(|promises| std::mem::take(&mut *promises.borrow_mut()));
    let count = pending.len();
    for promise in pending {
        promise.await;
    }
    count
}

/// Value slot filled in when a collected future resolves.
pub struct PromiseHandle<T> {
    value: Rc<RefCell<T>>,
    resolved: Rc<Cell<bool>>,
}

impl<T> Clone for PromiseHandle<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            resolved: self.resolved.clone(),
        }
    }
}

impl<T: Clone> PromiseHandle<T> {
    /// The resolved value, or the placeholder while pending.
    pub fn value(&self) -> T {
        self.value.borrow().clone()
    }
}

impl<T> PromiseHandle<T> {
    pub fn is_resolved(&self) -> bool {
        self.resolved.get()
    }
}
