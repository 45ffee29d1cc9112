use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::time::{
    ListenerControl, ListenerId, NOMINAL_FRAME_RATE, Tick, TickListener, TickSource,
};

/// Lifecycle of a [`Timeout`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TimerState {
    /// Registered with its source and accumulating progress.
    Active,
    /// Deregistered for good. `fired` tells whether the callback ran.
    Ended { fired: bool },
}

struct TimerCore {
    threshold: f64,
    frame_rate: f64,
    progress: f64,
    state: TimerState,
    callback: Option<Box<dyn FnOnce()>>,
}

impl TimerCore {
    /// Folds one frame into the timer. Returns `true` once expired.
    fn advance(&mut self, tick: &Tick) -> bool {
        // A stopped or zero-speed loop is a pause, not an instant expiry.
        if !(tick.speed.is_finite() && tick.speed > 0.0) {
            return false;
        }
        self.progress += tick.delta;
        let elapsed = self.progress / (self.frame_rate * tick.speed);
        elapsed > self.threshold
    }
}

/// Handle to a deferred callback running on a [`TickSource`].
///
/// Clones refer to the same timer. Both [`clear`](Self::clear) and
/// [`finish`](Self::finish) stay callable after the timer ended and do nothing
/// then.
#[derive(Clone)]
pub struct Timeout {
    core: Rc<RefCell<TimerCore>>,
    source: Rc<dyn TickSource>,
    listener: ListenerId,
}

impl Timeout {
    pub(crate) fn start(
        source: Rc<dyn TickSource>,
        frame_rate: f64,
        threshold: f64,
        callback: Box<dyn FnOnce()>,
    ) -> Self {
        let core = Rc::new(RefCell::new(TimerCore {
            threshold,
            frame_rate,
            progress: 0.0,
            state: TimerState::Active,
            callback: Some(callback),
        }));

        let listener_core = Rc::clone(&core);
        let listener: TickListener = Box::new(move |tick: &Tick| {
            let mut core = listener_core.borrow_mut();
            if core.state != TimerState::Active {
                return ListenerControl::Remove;
            }
            if !core.advance(tick) {
                return ListenerControl::Continue;
            }

            core.state = TimerState::Ended { fired: true };
            log::debug!(
                "timeout of {}s expired on frame {} (progress {:.3})",
                core.threshold,
                tick.frame,
                core.progress
            );
            match core.callback.take() {
                Some(callback) => ListenerControl::RemoveThen(callback),
                None => ListenerControl::Remove,
            }
        });

        let listener = source.add_listener(listener);
        log::debug!("timeout of {threshold}s armed as {listener:?}");

        Self { core, source, listener }
    }

    /// Cancels the timer. The callback will not run.
    pub fn clear(&self) {
        self.end(false);
    }

    /// Ends the timer now and runs the callback, regardless of progress.
    pub fn finish(&self) {
        self.end(true);
    }

    pub fn state(&self) -> TimerState {
        self.core.borrow().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == TimerState::Active
    }

    pub fn has_fired(&self) -> bool {
        self.state() == TimerState::Ended { fired: true }
    }

    /// Seconds of scaled time the timer waits for.
    pub fn threshold(&self) -> f64 {
        self.core.borrow().threshold
    }

    fn end(&self, fire: bool) {
        let callback = {
            let mut core = self.core.borrow_mut();
            if core.state != TimerState::Active {
                return;
            }
            core.state = TimerState::Ended { fired: fire };
            core.callback.take()
        };

        // Deregister before the callback so it can arm new timers on a clean source.
        self.source.remove_listener(self.listener);
        log::debug!("{:?} ended (fired: {fire})", self.listener);

        if fire {
            if let Some(callback) = callback {
                callback();
            }
        }
    }
}

impl fmt::Debug for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("Timeout")
            .field("listener", &self.listener)
            .field("threshold", &core.threshold)
            .field("state", &core.state)
            .finish()
    }
}

/// Runs `callback` once `seconds` of scaled time have passed on `source`.
///
/// Progress is measured in frames at [`NOMINAL_FRAME_RATE`]; use
/// [`Timeouts`](super::Timeouts) for a different rate.
pub fn set_timeout<S, F>(source: &S, seconds: f64, callback: F) -> Timeout
where
    S: TickSource + Clone + 'static,
    F: FnOnce() + 'static,
{
    Timeout::start(
        Rc::new(source.clone()),
        NOMINAL_FRAME_RATE,
        seconds,
        Box::new(callback),
    )
}

/// Same as [`Timeout::clear`].
pub fn clear_timeout(timeout: &Timeout) {
    timeout.clear();
}
