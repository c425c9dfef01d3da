//! Observer primitives shared by signals, the scheduler and the logger.
//!
//! Three dispatchers are provided:
//! - [`EventDispatcher`] broadcasts every dispatched value,
//! - [`FlagDispatcher`] notifies once per raise until it is reset,
//! - [`ValueDispatcher`] holds a current value and notifies on every change.
//!
//! Subscribing returns a [`Subscription`] guard. Dropping the guard (or calling
//! [`Subscription::unsubscribe`]) removes the handler. Use
//! [`Subscription::detach`] to keep a handler for the dispatcher's lifetime.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type HandlerList<H> = RefCell<Vec<(u64, Rc<H>)>>;

struct HandlerSet<H: ?Sized> {
    handlers: HandlerList<H>,
    next_id: Cell<u64>,
}

impl<H: ?Sized + 'static> HandlerSet<H> {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        })
    }

    fn insert(self: &Rc<Self>, handler: Rc<H>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        self.handlers.borrow_mut().push((id, handler));
        let weak: Weak<Self> = Rc::downgrade(self);
        Subscription::new(move || {
            if let Some(set) = weak.upgrade() {
                set.handlers.borrow_mut().retain(|(key, _)| *key != id);
            }
        })
    }

    /// Handlers are cloned out first so they may (un)subscribe while running.
    fn snapshot(&self) -> Vec<Rc<H>> {
        self.handlers
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }
}

/// Guard returned by every `subscribe` call.
#[must_use = "dropping a Subscription unsubscribes the handler"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(remove: impl FnOnce() + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// Remove the handler now.
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }

    /// Keep the handler registered until the dispatcher itself is dropped.
    pub fn detach(mut self) {
        self.remove = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

/// Broadcasts each dispatched value to all subscribers.
pub struct EventDispatcher<T: 'static> {
    set: Rc<HandlerSet<dyn Fn(&T)>>,
}

impl<T: 'static> Default for EventDispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> EventDispatcher<T> {
    pub fn new() -> Self {
        Self {
            set: HandlerSet::new(),
        }
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        self.set.insert(Rc::new(handler))
    }

    pub fn dispatch(&self, value: &T) {
        for handler in self.set.snapshot() {
            handler(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.set.len()
    }

    pub fn clear(&self) {
        self.set.clear();
    }

    /// Read-only view that can subscribe but not dispatch.
    pub fn subscribable(&self) -> EventSubscribable<T> {
        EventSubscribable {
            set: self.set.clone(),
        }
    }
}

#[derive(Clone)]
pub struct EventSubscribable<T: 'static> {
    set: Rc<HandlerSet<dyn Fn(&T)>>,
}

impl<T: 'static> EventSubscribable<T> {
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        self.set.insert(Rc::new(handler))
    }
}

struct FlagInner {
    set: Rc<HandlerSet<dyn Fn()>>,
    raised: Cell<bool>,
}

/// A flag that notifies subscribers once when raised.
///
/// Raising an already raised flag is a no-op until [`FlagDispatcher::reset`]
/// is called. Subscribing to a raised flag invokes the handler immediately.
#[derive(Clone)]
pub struct FlagDispatcher {
    inner: Rc<FlagInner>,
}

impl Default for FlagDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagDispatcher {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(FlagInner {
                set: HandlerSet::new(),
                raised: Cell::new(false),
            }),
        }
    }

    pub fn raise(&self) {
        if self.inner.raised.replace(true) {
            return;
        }
        for handler in self.inner.set.snapshot() {
            handler();
        }
    }

    pub fn reset(&self) {
        self.inner.raised.set(false);
    }

    pub fn is_raised(&self) -> bool {
        self.inner.raised.get()
    }

    pub fn subscribe(&self, handler: impl Fn() + 'static) -> Subscription {
        let handler: Rc<dyn Fn()> = Rc::new(handler);
        let subscription = self.inner.set.insert(handler.clone());
        if self.inner.raised.get() {
            handler();
        }
        subscription
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.set.len()
    }

    pub fn subscribable(&self) -> FlagSubscribable {
        FlagSubscribable {
            dispatcher: self.clone(),
        }
    }

    /// Drop every handler and lower the flag.
    pub(crate) fn clear(&self) {
        self.inner.set.clear();
        self.inner.raised.set(false);
    }

    pub(crate) fn ptr_eq(&self, other: &FlagDispatcher) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Read-only view of a [`FlagDispatcher`].
#[derive(Clone)]
pub struct FlagSubscribable {
    dispatcher: FlagDispatcher,
}

impl FlagSubscribable {
    pub fn subscribe(&self, handler: impl Fn() + 'static) -> Subscription {
        self.dispatcher.subscribe(handler)
    }

    pub fn is_raised(&self) -> bool {
        self.dispatcher.is_raised()
    }
}

struct ValueInner<T: 'static> {
    set: Rc<HandlerSet<dyn Fn(&T)>>,
    current: RefCell<T>,
}

/// Holds a value and notifies subscribers whenever it is replaced.
pub struct ValueDispatcher<T: Clone + 'static> {
    inner: Rc<ValueInner<T>>,
}

impl<T: Clone + 'static> Clone for ValueDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> ValueDispatcher<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(ValueInner {
                set: HandlerSet::new(),
                current: RefCell::new(initial),
            }),
        }
    }

    pub fn current(&self) -> T {
        self.inner.current.borrow().clone()
    }

    /// Replace the value and notify every subscriber.
    pub fn set_current(&self, value: T) {
        *self.inner.current.borrow_mut() = value.clone();
        for handler in self.inner.set.snapshot() {
            handler(&value);
        }
    }

    /// Subscribe, optionally receiving the current value right away.
    pub fn subscribe(
        &self,
        handler: impl Fn(&T) + 'static,
        dispatch_immediately: bool,
    ) -> Subscription {
        let handler: Rc<dyn Fn(&T)> = Rc::new(handler);
        let subscription = self.inner.set.insert(handler.clone());
        if dispatch_immediately {
            let current = self.current();
            handler(&current);
        }
        subscription
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.set.len()
    }

    pub fn subscribable(&self) -> ValueSubscribable<T> {
        ValueSubscribable {
            dispatcher: self.clone(),
        }
    }
}

/// Read-only view of a [`ValueDispatcher`].
pub struct ValueSubscribable<T: Clone + 'static> {
    dispatcher: ValueDispatcher<T>,
}

impl<T: Clone + 'static> Clone for ValueSubscribable<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<T: Clone + 'static> ValueSubscribable<T> {
    pub fn current(&self) -> T {
        self.dispatcher.current()
    }

    pub fn subscribe(
        &self,
        handler: impl Fn(&T) + 'static,
        dispatch_immediately: bool,
    ) -> Subscription {
        self.dispatcher.subscribe(handler, dispatch_immediately)
    }
}
