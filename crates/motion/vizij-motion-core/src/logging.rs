//! Scene logger.
//!
//! Every entry is kept in the logger history, broadcast through
//! [`Logger::on_logged`] and forwarded to the `log` facade so hosts can route
//! it through whatever backend they install.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::events::{EventDispatcher, EventSubscribable};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Http,
    Verbose,
    Debug,
    Silly,
}

impl LogLevel {
    fn facade_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Http | LogLevel::Verbose | LogLevel::Debug => log::Level::Debug,
            LogLevel::Silly => log::Level::Trace,
        }
    }
}

/// A structured log entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogPayload {
    pub level: Option<LogLevel>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl LogPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            level: None,
            message: message.into(),
            remarks: None,
            object: None,
            duration_ms: None,
        }
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn with_object(mut self, object: serde_json::Value) -> Self {
        self.object = Some(object);
        self
    }
}

impl From<&str> for LogPayload {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for LogPayload {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

pub struct Logger {
    history: RefCell<Vec<LogPayload>>,
    logged: EventDispatcher<LogPayload>,
    profilers: RefCell<HashMap<String, Instant>>,
    record_history: bool,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub fn new() -> Self {
        Self {
            history: RefCell::new(Vec::new()),
            logged: EventDispatcher::new(),
            profilers: RefCell::new(HashMap::new()),
            record_history: true,
        }
    }

    /// A logger that only forwards to the `log` facade.
    pub fn forwarding() -> Self {
        Self {
            record_history: false,
            ..Self::new()
        }
    }

    pub fn on_logged(&self) -> EventSubscribable<LogPayload> {
        self.logged.subscribable()
    }

    pub fn history(&self) -> Vec<LogPayload> {
        self.history.borrow().clone()
    }

    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    /// Record an entry as-is. Entries without a level are treated as info.
    pub fn log(&self, payload: LogPayload) {
        let level = payload.level.unwrap_or(LogLevel::Info);
        match &payload.remarks {
            Some(remarks) => log::log!(
                target: "vizij_motion",
                level.facade_level(),
                "{} ({})",
                payload.message,
                remarks
            ),
            None => log::log!(target: "vizij_motion", level.facade_level(), "{}", payload.message),
        }
        if self.record_history {
            self.history.borrow_mut().push(payload.clone());
        }
        self.logged.dispatch(&payload);
    }

    pub fn log_level(&self, level: LogLevel, payload: impl Into<LogPayload>) {
        let mut payload = payload.into();
        payload.level = Some(level);
        self.log(payload);
    }

    pub fn error(&self, payload: impl Into<LogPayload>) {
        self.log_level(LogLevel::Error, payload);
    }

    pub fn warn(&self, payload: impl Into<LogPayload>) {
        self.log_level(LogLevel::Warn, payload);
    }

    pub fn info(&self, payload: impl Into<LogPayload>) {
        self.log_level(LogLevel::Info, payload);
    }

    pub fn http(&self, payload: impl Into<LogPayload>) {
        self.log_level(LogLevel::Http, payload);
    }

    pub fn verbose(&self, payload: impl Into<LogPayload>) {
        self.log_level(LogLevel::Verbose, payload);
    }

    pub fn debug(&self, payload: impl Into<LogPayload>) {
        self.log_level(LogLevel::Debug, payload);
    }

    pub fn silly(&self, payload: impl Into<LogPayload>) {
        self.log_level(LogLevel::Silly, payload);
    }

    /// Start a profiler under `id`, or finish it and log the elapsed time.
    ///
    /// The first call with a given id only records the start instant. The
    /// second call logs `payload` at debug level with `duration_ms` filled in.
    pub fn profile(&self, id: &str, payload: Option<LogPayload>) {
        let started = self.profilers.borrow_mut().remove(id);
        match started {
            None => {
                self.profilers
                    .borrow_mut()
                    .insert(id.to_string(), Instant::now());
            }
            Some(start) => {
                let mut payload = payload.unwrap_or_else(|| LogPayload::new(id));
                payload.duration_ms = Some(start.elapsed().as_secs_f64() * 1000.0);
                self.log_level(LogLevel::Debug, payload);
            }
        }
    }
}

thread_local! {
    static FALLBACK: Rc<Logger> = Rc::new(Logger::forwarding());
}

/// Logger used when no scene is active.
pub fn fallback_logger() -> Rc<Logger> {
    FALLBACK.with(Rc::clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn log_pushes_history_and_fires_event() {
        let logger = Logger::new();
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        let _sub = logger.on_logged().subscribe(move |payload: &LogPayload| {
            assert_eq!(payload.message, "hello");
            seen.set(seen.get() + 1);
        });
        logger.log(LogPayload::new("hello"));
        assert_eq!(logger.history().len(), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn level_helpers_tag_entries() {
        let logger = Logger::new();
        logger.error("a");
        logger.warn("b");
        logger.silly(LogPayload::new("c").with_remarks("extra"));
        let levels: Vec<_> = logger.history().iter().map(|p| p.level).collect();
        assert_eq!(
            levels,
            vec![
                Some(LogLevel::Error),
                Some(LogLevel::Warn),
                Some(LogLevel::Silly)
            ]
        );
        assert_eq!(logger.history()[2].remarks.as_deref(), Some("extra"));
    }

    #[test]
    fn profile_logs_duration_on_second_call() {
        let logger = Logger::new();
        logger.profile("id", None);
        assert!(logger.history().is_empty());
        logger.profile("id", Some(LogPayload::new("done")));
        let last = logger.history().pop().unwrap();
        assert_eq!(last.level, Some(LogLevel::Debug));
        assert_eq!(last.message, "done");
        assert!(last.duration_ms.unwrap() >= 0.0);
    }

    #[test]
    fn forwarding_logger_keeps_no_history() {
        let logger = Logger::forwarding();
        logger.warn("dropped");
        assert!(logger.history().is_empty());
    }
}
