use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use framedelay::time::{Ticker, TickerConfig};
use framedelay::timeout::{TickerHost, Timeouts};

/// Window and ticker configuration.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub ticker: TickerConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "framedelay".to_string(),
            initial_size: LogicalSize::new(640.0, 240.0),
            // Started on `resumed`, once the window exists.
            ticker: TickerConfig {
                auto_start: false,
                ..TickerConfig::default()
            },
        }
    }
}

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Per-frame context handed to the app.
pub struct FrameCtx<'a> {
    pub window: &'a Window,
    pub ticker: &'a Ticker,
    pub timeouts: &'a Timeouts,
}

/// Application contract driven by [`Runtime`].
pub trait App {
    /// Called once the ticker and timeout factory exist.
    fn on_start(&mut self, timeouts: &Timeouts) {
        let _ = timeouts;
    }

    /// Called for every key press (repeats excluded).
    fn on_key(&mut self, key: KeyCode, ctx: &mut FrameCtx<'_>) -> AppControl {
        let _ = (key, ctx);
        AppControl::Continue
    }

    /// Called after the ticker advanced for a redrawn frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;
}

/// Owns the render-loop ticker for one window.
pub struct Runtime {
    config: DemoConfig,
    ticker: Ticker,
}

impl TickerHost for Runtime {
    fn ticker(&self) -> Option<Ticker> {
        Some(self.ticker.clone())
    }
}

impl Runtime {
    pub fn new(config: DemoConfig) -> Self {
        let ticker = Ticker::new(config.ticker.clone());
        Self { config, ticker }
    }

    pub fn run<A>(self, mut app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let timeouts = Timeouts::builder()
            .host(Some(&self))
            .build()
            .context("failed to set up timeouts")?;
        app.on_start(&timeouts);

        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            config: self.config,
            ticker: self.ticker,
            timeouts,
            app,
            window: None,
            exit_requested: false,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

struct AppState<A>
where
    A: App + 'static,
{
    config: DemoConfig,
    ticker: Ticker,
    timeouts: Timeouts,
    app: A,

    window: Option<Window>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        self.window = Some(window);
        Ok(())
    }

    fn apply(&mut self, event_loop: &ActiveEventLoop, control: AppControl) {
        if control == AppControl::Exit {
            self.exit_requested = true;
        }
        if self.exit_requested {
            event_loop.exit();
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window(event_loop) {
                log::error!("failed to create window: {e:#}");
                self.exit_requested = true;
                event_loop.exit();
                return;
            }
        }

        // Restarting resets the frame clock, so suspended time never reaches timers.
        self.ticker.start();

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.ticker.stop();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; every redraw is one ticker frame.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(window) = self.window.as_ref() else {
            return;
        };

        let mut ctx = FrameCtx {
            window,
            ticker: &self.ticker,
            timeouts: &self.timeouts,
        };

        let control = match &event {
            WindowEvent::CloseRequested => AppControl::Exit,

            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match event.physical_key {
                    PhysicalKey::Code(code) => self.app.on_key(code, &mut ctx),
                    PhysicalKey::Unidentified(_) => AppControl::Continue,
                }
            }

            WindowEvent::RedrawRequested => {
                ctx.ticker.update();
                self.app.on_frame(&mut ctx)
            }

            _ => AppControl::Continue,
        };

        self.apply(event_loop, control);
    }
}
