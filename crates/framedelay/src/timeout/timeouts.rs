use std::fmt;
use std::rc::Rc;

use crate::error::SetupError;
use crate::time::{NOMINAL_FRAME_RATE, TickSource, Ticker};

use super::handle::Timeout;

/// Timeout factory configuration.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Frames per second one unit of tick delta stands for.
    pub nominal_frame_rate: f64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            nominal_frame_rate: NOMINAL_FRAME_RATE,
        }
    }
}

/// Environment that may own a render-loop ticker.
pub trait TickerHost {
    fn ticker(&self) -> Option<Ticker>;
}

/// Factory for timeouts bound to one tick source.
#[derive(Clone)]
pub struct Timeouts {
    source: Rc<dyn TickSource>,
    config: TimeoutConfig,
}

impl Timeouts {
    /// Binds a factory to `source` with the default configuration.
    pub fn new<S: TickSource + 'static>(source: S) -> Self {
        Self {
            source: Rc::new(source),
            config: TimeoutConfig::default(),
        }
    }

    pub fn builder() -> TimeoutsBuilder {
        TimeoutsBuilder::default()
    }

    /// Runs `callback` after `seconds` of scaled time on this factory's source.
    pub fn set_timeout<F>(&self, seconds: f64, callback: F) -> Timeout
    where
        F: FnOnce() + 'static,
    {
        Timeout::start(
            Rc::clone(&self.source),
            self.config.nominal_frame_rate,
            seconds,
            Box::new(callback),
        )
    }

    pub fn config(&self) -> &TimeoutConfig {
        &self.config
    }

    /// Speed currently reported by the source.
    pub fn speed(&self) -> f64 {
        self.source.speed()
    }
}

impl fmt::Debug for Timeouts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeouts")
            .field("config", &self.config)
            .field("speed", &self.source.speed())
            .finish()
    }
}

/// Builder validating a [`Timeouts`] factory once, up front.
///
/// ```rust
/// use framedelay::{SetupError, Ticker, Timeouts};
///
/// let timeouts = Timeouts::builder().ticker(&Ticker::default()).build().unwrap();
/// assert_eq!(timeouts.config().nominal_frame_rate, 60.0);
///
/// assert_eq!(Timeouts::builder().build().unwrap_err(), SetupError::TickerMissing);
/// ```
#[derive(Default)]
pub struct TimeoutsBuilder {
    source: Option<Rc<dyn TickSource>>,
    host_missing: bool,
    config: TimeoutConfig,
}

impl TimeoutsBuilder {
    pub fn source<S: TickSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Rc::new(source));
        self
    }

    pub fn ticker(self, ticker: &Ticker) -> Self {
        self.source(ticker.clone())
    }

    /// Takes the tick source from `host`.
    ///
    /// `None` fails the build with [`SetupError::HostMissing`]; a host without
    /// a ticker fails it with [`SetupError::TickerMissing`].
    pub fn host(mut self, host: Option<&dyn TickerHost>) -> Self {
        match host {
            None => self.host_missing = true,
            Some(host) => {
                self.host_missing = false;
                self.source = host
                    .ticker()
                    .map(|ticker| Rc::new(ticker) as Rc<dyn TickSource>);
            }
        }
        self
    }

    pub fn nominal_frame_rate(mut self, rate: f64) -> Self {
        self.config.nominal_frame_rate = rate;
        self
    }

    pub fn config(mut self, config: TimeoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Timeouts, SetupError> {
        if self.host_missing {
            return Err(SetupError::HostMissing);
        }

        let source = self.source.ok_or(SetupError::TickerMissing)?;

        let rate = self.config.nominal_frame_rate;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SetupError::InvalidFrameRate(rate));
        }

        log::debug!("timeouts ready at {rate} frames per second");
        Ok(Timeouts {
            source,
            config: self.config,
        })
    }
}
