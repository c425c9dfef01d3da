//! Ambient context stacks.
//!
//! Threads, scenes and playback status are resolved without parameter
//! threading: callers push an entry when entering a scope and pop it on exit.
//! Pops must happen in LIFO order, otherwise a [`MotionError::StackOrder`]
//! is returned (the top entry is still removed).

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{MotionError, Result};
use crate::logging::{fallback_logger, Logger};
use crate::playback::PlaybackStatus;
use crate::threading::Thread;

pub(crate) trait StackEntry: Clone {
    fn same(&self, other: &Self) -> bool;
    fn label(&self) -> String;
}

pub(crate) struct ContextStack<T> {
    kind: &'static str,
    entries: RefCell<Vec<T>>,
}

impl<T: StackEntry> ContextStack<T> {
    pub(crate) const fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, entry: T) {
        self.entries.borrow_mut().push(entry);
    }

    pub(crate) fn pop(&self, expected: &T) -> Result<()> {
        let top = self.entries.borrow_mut().pop();
        match top {
            Some(actual) if actual.same(expected) => Ok(()),
            Some(actual) => Err(self.out_of_order(expected.label(), actual.label())),
            None => Err(self.out_of_order(expected.label(), "<empty>".to_string())),
        }
    }

    pub(crate) fn top(&self) -> Option<T> {
        self.entries.borrow().last().cloned()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    fn out_of_order(&self, expected: String, actual: String) -> MotionError {
        let mut stack = self.kind.to_string();
        if let Some(first) = stack.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        MotionError::StackOrder {
            stack,
            expected,
            actual,
        }
    }
}

/// Collaborator owning the logger for everything running inside it.
pub trait Scene {
    fn name(&self) -> &str;
    fn logger(&self) -> Rc<Logger>;
}

/// Minimal scene used by hosts that only need a name and a logger.
pub struct BasicScene {
    name: String,
    logger: Rc<Logger>,
}

impl BasicScene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logger: Rc::new(Logger::new()),
        }
    }

    pub fn with_logger(name: impl Into<String>, logger: Rc<Logger>) -> Self {
        Self {
            name: name.into(),
            logger,
        }
    }
}

impl Scene for BasicScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn logger(&self) -> Rc<Logger> {
        self.logger.clone()
    }
}

impl StackEntry for Rc<dyn Scene> {
    fn same(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(self), Rc::as_ptr(other))
    }

    fn label(&self) -> String {
        self.name().to_string()
    }
}

impl StackEntry for Rc<PlaybackStatus> {
    fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }

    fn label(&self) -> String {
        format!("playback@frame {}", self.frame())
    }
}

impl StackEntry for Thread {
    fn same(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }

    fn label(&self) -> String {
        self.describe()
    }
}

thread_local! {
    static THREADS: ContextStack<Thread> = const { ContextStack::new("thread") };
    static SCENES: ContextStack<Rc<dyn Scene>> = const { ContextStack::new("scene") };
    static PLAYBACKS: ContextStack<Rc<PlaybackStatus>> = const { ContextStack::new("playback") };
}

pub fn start_thread(thread: &Thread) {
    THREADS.with(|stack| stack.push(thread.clone()));
}

pub fn end_thread(thread: &Thread) -> Result<()> {
    THREADS.with(|stack| stack.pop(thread))
}

/// The thread currently being resumed.
pub fn use_thread() -> Result<Thread> {
    THREADS.with(|stack| stack.top().ok_or_else(|| MotionError::missing("thread")))
}

/// Precise time of the current thread.
pub fn use_time() -> Result<f64> {
    Ok(use_thread()?.time())
}

pub fn start_scene(scene: &Rc<dyn Scene>) {
    SCENES.with(|stack| stack.push(scene.clone()));
}

pub fn end_scene(scene: &Rc<dyn Scene>) -> Result<()> {
    SCENES.with(|stack| stack.pop(scene))
}

pub fn use_scene() -> Result<Rc<dyn Scene>> {
    SCENES.with(|stack| stack.top().ok_or_else(|| MotionError::missing("scene")))
}

/// Logger of the active scene, or the forwarding logger outside of scenes.
pub fn use_logger() -> Rc<Logger> {
    SCENES
        .with(|stack| stack.top())
        .map(|scene| scene.logger())
        .unwrap_or_else(fallback_logger)
}

pub fn start_playback(status: &Rc<PlaybackStatus>) {
    PLAYBACKS.with(|stack| stack.push(status.clone()));
}

pub fn end_playback(status: &Rc<PlaybackStatus>) -> Result<()> {
    PLAYBACKS.with(|stack| stack.pop(status))
}

pub fn use_playback() -> Result<Rc<PlaybackStatus>> {
    PLAYBACKS.with(|stack| {
        stack
            .top()
            .ok_or_else(|| MotionError::missing("playback"))
    })
}

pub(crate) fn try_use_playback() -> Option<Rc<PlaybackStatus>> {
    PLAYBACKS.with(|stack| stack.top())
}

#[cfg(test)]
pub(crate) fn stack_depths() -> (usize, usize, usize) {
    (
        THREADS.with(|s| s.len()),
        SCENES.with(|s| s.len()),
        PLAYBACKS.with(|s| s.len()),
    )
}
