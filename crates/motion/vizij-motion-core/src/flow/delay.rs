//! Deferred execution.

use crate::flow::chain::{chain, Chain, FlowItem};
use crate::flow::scheduling::wait_for;

/// Wait `seconds`, then run `item` (a task or a [`callback`](crate::flow::callback)).
pub fn delay(seconds: f64, item: impl Into<FlowItem>) -> Chain {
    chain([FlowItem::from(wait_for(seconds)), item.into()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{end_playback, start_playback, use_thread};
    use crate::flow::callback;
    use crate::playback::PlaybackStatus;
    use crate::threading::{Step, Task, Threads};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn runs_callback_after_the_delay() {
        let fired_at = Rc::new(Cell::new(None));
        let sink = fired_at.clone();
        let task = delay(
            0.5,
            callback(move || {
                sink.set(Some(use_thread()?.time()));
                Ok(())
            }),
        );
        let status = Rc::new(PlaybackStatus::new(10.0));
        let mut runner = Threads::new(task);
        let mut ticks = 0;
        loop {
            ticks += 1;
            start_playback(&status);
            let step = runner.resume().unwrap();
            end_playback(&status).unwrap();
            if matches!(step, Step::Done) {
                break;
            }
        }
        assert_eq!(ticks, 5);
        assert_eq!(fired_at.get(), Some(0.5));
    }
}
