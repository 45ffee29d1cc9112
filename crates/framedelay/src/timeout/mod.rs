//! Deferred callbacks that advance with a tick source.
//!
//! A [`Timeout`] adds up the deltas its source delivers and fires once
//! `progress / (frame_rate * speed)` exceeds its threshold in seconds. Since
//! nothing advances while the source is stopped, timers pause and resume with
//! the render loop.

mod handle;
mod timeouts;

pub use handle::{Timeout, TimerState, clear_timeout, set_timeout};
pub use timeouts::{TickerHost, TimeoutConfig, Timeouts, TimeoutsBuilder};
