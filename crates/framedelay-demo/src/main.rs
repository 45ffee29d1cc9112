mod app;
mod runtime;

use anyhow::{Context, Result};

use framedelay::logging::{LoggingConfig, init_logging};

use app::DemoApp;
use runtime::{DemoConfig, Runtime};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let delay = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<f64>()
            .with_context(|| format!("invalid delay in seconds: {arg:?}"))?,
        None => 2.0,
    };

    Runtime::new(DemoConfig::default()).run(DemoApp::new(delay))
}
