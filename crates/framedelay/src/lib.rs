//! Frame-driven timeouts.
//!
//! `setTimeout`-style deferred callbacks whose clock is a render loop's
//! per-frame tick instead of wall time. Stop the loop and every pending
//! timeout stops with it.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use framedelay::time::Ticker;
//! use framedelay::timeout::set_timeout;
//!
//! let ticker = Ticker::default();
//! let fired = Rc::new(Cell::new(false));
//! let flag = fired.clone();
//!
//! let _timeout = set_timeout(&ticker, 1.0, move || flag.set(true));
//!
//! for _ in 0..61 {
//!     ticker.tick(1.0);
//! }
//! assert!(fired.get());
//! ```

pub mod error;
pub mod logging;
pub mod time;
pub mod timeout;

pub use error::SetupError;
pub use time::{TickSource, Ticker, TickerConfig};
pub use timeout::{Timeout, TimeoutConfig, Timeouts, clear_timeout, set_timeout};
