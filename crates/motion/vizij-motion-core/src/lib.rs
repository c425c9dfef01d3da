//! Vizij Motion Core (engine-agnostic)
//!
//! Reactive signals, cooperative threads and tweening for driving procedural
//! animation one frame at a time.
//!
//! - [`signals`]: value cells with automatic dependency tracking
//! - [`threading`]: resumable tasks scheduled as a tree of threads
//! - [`flow`]: combinators such as `all`, `any`, `chain`, `loop_` and `every`
//! - [`tweening`]: timing functions, interpolation, tweens and springs
//! - [`playback`]: the frame clock and the driver that ticks the scheduler
//!
//! Everything is single threaded; handles are `Rc` based and the ambient
//! thread, scene and playback are resolved through the [`context`] stacks.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod flow;
pub mod logging;
pub mod playback;
pub mod signals;
pub mod threading;
pub mod tweening;
pub mod types;
pub mod value;

// Re-exports for consumers
pub use config::{MotionConfig, SpringSettings};
pub use context::{use_logger, use_playback, use_scene, use_thread, use_time, BasicScene, Scene};
pub use error::{MotionError, Result};
pub use events::{EventDispatcher, FlagDispatcher, Subscription, ValueDispatcher};
pub use logging::{LogLevel, LogPayload, Logger};
pub use playback::{PlaybackDriver, PlaybackState, PlaybackStatus};
pub use signals::{Computed, CompoundSignal, DependencyContext, Signal, SignalValue, Vector2Signal};
pub use threading::{BoxedTask, Step, Task, TaskExt, Thread, Threads};
pub use tweening::{Easing, Spring};
pub use types::Vector2;
pub use value::{Value, ValueKind};
