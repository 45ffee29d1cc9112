use std::fmt;

/// Failure to wire a [`Timeouts`](crate::timeout::Timeouts) factory.
///
/// Raised once at setup; a timer that exists never produces an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    /// A host was requested but none was supplied.
    HostMissing,
    /// No tick source was supplied, or the host does not expose one.
    TickerMissing,
    /// The nominal frame rate must be finite and positive.
    InvalidFrameRate(f64),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostMissing => f.write_str("host environment was not found"),
            Self::TickerMissing => f.write_str("tick source was not found"),
            Self::InvalidFrameRate(rate) => write!(f, "invalid nominal frame rate: {rate}"),
        }
    }
}

impl std::error::Error for SetupError {}
