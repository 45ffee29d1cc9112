use std::cell::{Cell, RefCell};
use std::rc::Rc;

use winit::keyboard::KeyCode;

use framedelay::timeout::{Timeout, Timeouts, clear_timeout};

use crate::runtime::{App, AppControl, FrameCtx};

/// Keyboard playground for frame-driven timeouts.
///
/// - `T` arms a timeout of `delay` seconds
/// - `C` clears the most recent pending timeout
/// - `F` finishes the most recent pending timeout
/// - `H` stops the heartbeat
/// - `Space` pauses / resumes the ticker
/// - `Esc` quits
pub struct DemoApp {
    delay: f64,
    next_label: u32,
    pending: Vec<(u32, Timeout)>,
    fired: Rc<RefCell<Vec<u32>>>,
    beats: Rc<Cell<u32>>,
    heartbeat: Rc<RefCell<Option<Timeout>>>,
    title: String,
}

impl DemoApp {
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            next_label: 1,
            pending: Vec::new(),
            fired: Rc::new(RefCell::new(Vec::new())),
            beats: Rc::new(Cell::new(0)),
            heartbeat: Rc::new(RefCell::new(None)),
            title: String::new(),
        }
    }

    fn arm(&mut self, timeouts: &Timeouts) {
        let label = self.next_label;
        self.next_label += 1;

        let fired = Rc::clone(&self.fired);
        let timeout = timeouts.set_timeout(self.delay, move || {
            fired.borrow_mut().push(label);
            log::info!("timeout #{label} fired");
        });

        log::info!("timeout #{label} armed for {}s", self.delay);
        self.pending.push((label, timeout));
    }

    fn status(&self, ctx: &FrameCtx<'_>) -> String {
        format!(
            "framedelay | {} | pending {} | fired {} | heartbeat {}",
            if ctx.ticker.is_started() { "running" } else { "paused" },
            self.pending.len(),
            self.fired.borrow().len(),
            self.beats.get(),
        )
    }
}

/// Re-arms itself from its own callback once per second of ticker time.
///
/// `slot` always holds the pending beat, so clearing it stops the chain.
fn heartbeat(timeouts: Timeouts, beats: Rc<Cell<u32>>, slot: Rc<RefCell<Option<Timeout>>>) {
    let next = timeouts.clone();
    let next_slot = Rc::clone(&slot);
    let timeout = timeouts.set_timeout(1.0, move || {
        beats.set(beats.get() + 1);
        log::debug!("heartbeat {}", beats.get());
        heartbeat(next, beats, next_slot);
    });
    *slot.borrow_mut() = Some(timeout);
}

fn stop_heartbeat(slot: &RefCell<Option<Timeout>>) -> bool {
    match slot.borrow_mut().take() {
        Some(timeout) => {
            clear_timeout(&timeout);
            true
        }
        None => false,
    }
}

impl App for DemoApp {
    fn on_start(&mut self, timeouts: &Timeouts) {
        heartbeat(
            timeouts.clone(),
            Rc::clone(&self.beats),
            Rc::clone(&self.heartbeat),
        );
        log::info!(
            "T: arm  C: clear  F: finish  H: stop heartbeat  Space: pause/resume  Esc: quit"
        );
    }

    fn on_key(&mut self, key: KeyCode, ctx: &mut FrameCtx<'_>) -> AppControl {
        match key {
            KeyCode::KeyT => self.arm(ctx.timeouts),
            KeyCode::KeyC => {
                if let Some((label, timeout)) = self.pending.pop() {
                    clear_timeout(&timeout);
                    log::info!("timeout #{label} cleared");
                }
            }
            KeyCode::KeyF => {
                if let Some((label, timeout)) = self.pending.pop() {
                    log::info!("timeout #{label} finished early");
                    timeout.finish();
                }
            }
            KeyCode::KeyH => {
                if stop_heartbeat(&self.heartbeat) {
                    log::info!("heartbeat stopped after {} beats", self.beats.get());
                }
            }
            KeyCode::Space => {
                if ctx.ticker.is_started() {
                    ctx.ticker.stop();
                    log::info!("paused");
                } else {
                    ctx.ticker.start();
                    log::info!("resumed");
                }
            }
            KeyCode::Escape => return AppControl::Exit,
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        self.pending.retain(|(_, timeout)| timeout.is_active());

        let title = self.status(ctx);
        if title != self.title {
            ctx.window.set_title(&title);
            self.title = title;
        }

        AppControl::Continue
    }
}
