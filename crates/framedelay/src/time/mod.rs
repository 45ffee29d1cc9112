//! Time subsystem.
//!
//! - [`FrameClock`] measures clamped wall-clock deltas between frames.
//! - [`TickSource`] is the per-frame listener contract timers run on.
//! - [`Ticker`] is the render-loop implementation of it: call
//!   [`Ticker::update`] once per presented frame, or [`Ticker::tick`] with an
//!   explicit delta.

mod frame_clock;
mod ticker;

pub use frame_clock::{FrameClock, FrameTime};
pub use ticker::{
    ListenerControl, ListenerId, NOMINAL_FRAME_RATE, Tick, TickListener, TickSource, Ticker,
    TickerConfig,
};
