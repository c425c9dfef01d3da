//! Flow combinators composing tasks.
//!
//! Every combinator is itself a [`Task`](crate::threading::Task), so they
//! nest freely. Concurrent combinators (`all`, `any`, `sequence`) start each
//! task on a child thread of the thread running them.

pub mod all;
pub mod any;
pub mod chain;
pub mod delay;
pub mod every;
pub mod join;
pub mod loop_;
pub mod loop_for;
pub mod run;
pub mod scheduling;
pub mod sequence;

pub use all::{all, All};
pub use any::{any, Any};
pub use chain::{callback, chain, Chain, FlowItem};
pub use delay::delay;
pub use every::{every, Every, EveryRunner, EverySync};
pub use join::{join, Join};
pub use loop_::{loop_, loop_times, Loop, LoopCount};
pub use loop_for::{loop_for, LoopFor};
pub use run::{run, run_named, Run};
pub use scheduling::{cancel, wait_for, wait_until, WaitFor, WaitUntil};
pub use sequence::{sequence, Sequence};
