use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::frame_clock::FrameClock;

/// Frames per second that a delta of `1.0` corresponds to.
pub const NOMINAL_FRAME_RATE: f64 = 60.0;

/// One frame as seen by a listener.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tick {
    /// Frame progress since the previous tick; `1.0` is one frame at
    /// [`NOMINAL_FRAME_RATE`].
    pub delta: f64,

    /// The source's speed when this listener runs.
    pub speed: f64,

    /// Index of the dispatched frame.
    pub frame: u64,
}

/// Identifies a registered listener.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// What the source should do with a listener after it ran.
pub enum ListenerControl {
    Continue,
    Remove,
    /// Deregister the listener, then run the callback.
    RemoveThen(Box<dyn FnOnce()>),
}

impl fmt::Debug for ListenerControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("Continue"),
            Self::Remove => f.write_str("Remove"),
            Self::RemoveThen(_) => f.write_str("RemoveThen(..)"),
        }
    }
}

pub type TickListener = Box<dyn FnMut(&Tick) -> ListenerControl>;

/// Something that calls listeners once per frame.
///
/// Implementations are single-threaded. A listener may add or remove
/// listeners (including itself) while it runs.
pub trait TickSource {
    /// Registers `listener`; it runs from the next dispatched frame on.
    fn add_listener(&self, listener: TickListener) -> ListenerId;

    /// Deregisters a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);

    /// Current time-scale multiplier (1.0 = normal).
    fn speed(&self) -> f64;
}

impl<S: TickSource + ?Sized> TickSource for Rc<S> {
    fn add_listener(&self, listener: TickListener) -> ListenerId {
        (**self).add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        (**self).remove_listener(id)
    }

    fn speed(&self) -> f64 {
        (**self).speed()
    }
}

/// Ticker configuration.
#[derive(Debug, Clone)]
pub struct TickerConfig {
    pub speed: f64,

    /// Lowest frame rate the wall-clock driver will report. Slower frames are
    /// clamped to `1 / min_fps` seconds.
    pub min_fps: f64,

    /// Start delivering frames immediately.
    pub auto_start: bool,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            min_fps: 10.0,
            auto_start: true,
        }
    }
}

type SharedListener = Rc<RefCell<TickListener>>;

struct Inner {
    listeners: Vec<(ListenerId, SharedListener)>,
    next_id: u64,
    speed: f64,
    started: bool,
    frame: u64,
    clock: FrameClock,
}

/// Render-loop ticker.
///
/// A cheap handle; clones share the same listener set. Drive it either with
/// explicit deltas through [`tick`](Self::tick) or from wall-clock time with
/// [`update`](Self::update) once per rendered frame. A stopped ticker
/// delivers nothing, which pauses everything registered on it.
#[derive(Clone)]
pub struct Ticker {
    inner: Rc<RefCell<Inner>>,
}

impl Ticker {
    pub fn new(config: TickerConfig) -> Self {
        let mut clock = FrameClock::new();
        if let Some(dt_max) = frame_budget(config.min_fps) {
            clock.set_dt_max(dt_max);
        } else {
            log::warn!("ignoring invalid min_fps {}", config.min_fps);
        }

        let ticker = Self {
            inner: Rc::new(RefCell::new(Inner {
                listeners: Vec::new(),
                next_id: 0,
                speed: 1.0,
                started: false,
                frame: 0,
                clock,
            })),
        };

        ticker.set_speed(config.speed);
        if config.auto_start {
            ticker.start();
        }
        ticker
    }

    pub fn start(&self) {
        self.start_at(Instant::now());
    }

    /// Starts delivering frames, measuring wall-clock time from `now`.
    pub fn start_at(&self, now: Instant) {
        let mut inner = self.inner.borrow_mut();
        if inner.started {
            return;
        }
        inner.started = true;
        inner.clock.reset_at(now);
        log::debug!("ticker started");
    }

    pub fn stop(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.started {
            inner.started = false;
            log::debug!("ticker stopped at frame {}", inner.frame);
        }
    }

    pub fn is_started(&self) -> bool {
        self.inner.borrow().started
    }

    /// Sets the time-scale multiplier.
    ///
    /// Non-positive or non-finite speeds are stored as given; timers treat
    /// frames at such speeds as paused.
    pub fn set_speed(&self, speed: f64) {
        if !speed.is_finite() || speed < 0.0 {
            log::warn!("ticker speed set to {speed}");
        }
        self.inner.borrow_mut().speed = speed;
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Number of frames dispatched so far.
    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frame
    }

    /// Dispatches one frame carrying `delta`. Does nothing while stopped.
    pub fn tick(&self, delta: f64) {
        if !self.is_started() {
            return;
        }
        self.dispatch(delta);
    }

    /// Measures wall-clock time since the previous frame and dispatches it.
    pub fn update(&self) {
        self.update_at(Instant::now());
    }

    pub fn update_at(&self, now: Instant) {
        let delta = {
            let mut inner = self.inner.borrow_mut();
            if !inner.started {
                return;
            }
            let ft = inner.clock.tick_at(now);
            ft.dt * NOMINAL_FRAME_RATE * inner.speed
        };
        self.dispatch(delta);
    }

    fn contains(&self, id: ListenerId) -> bool {
        self.inner.borrow().listeners.iter().any(|(i, _)| *i == id)
    }

    fn dispatch(&self, delta: f64) {
        // Snapshot so listeners can mutate the registry while we iterate.
        let (frame, snapshot) = {
            let mut inner = self.inner.borrow_mut();
            let frame = inner.frame;
            inner.frame = inner.frame.wrapping_add(1);
            (frame, inner.listeners.clone())
        };

        log::trace!(
            "frame {frame} delta {delta:.4} listeners {}",
            snapshot.len()
        );

        for (id, listener) in snapshot {
            if !self.contains(id) {
                continue;
            }

            // Speed is read per listener; an earlier one may have changed it.
            let tick = Tick {
                delta,
                speed: self.speed(),
                frame,
            };

            let control = match listener.try_borrow_mut() {
                Ok(mut guard) => {
                    let f: &mut TickListener = &mut guard;
                    f(&tick)
                }
                Err(_) => {
                    log::warn!("listener {id:?} re-entered during its own dispatch; skipped");
                    continue;
                }
            };

            match control {
                ListenerControl::Continue => {}
                ListenerControl::Remove => self.remove_listener(id),
                ListenerControl::RemoveThen(then) => {
                    self.remove_listener(id);
                    then();
                }
            }
        }
    }
}

impl TickSource for Ticker {
    fn add_listener(&self, listener: TickListener) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Rc::new(RefCell::new(listener))));
        log::trace!("listener {id:?} added");
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(i, _)| *i != id);
        if inner.listeners.len() != before {
            log::trace!("listener {id:?} removed");
        }
    }

    fn speed(&self) -> f64 {
        self.inner.borrow().speed
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TickerConfig::default())
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Ticker")
            .field("speed", &inner.speed)
            .field("started", &inner.started)
            .field("frame", &inner.frame)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

fn frame_budget(min_fps: f64) -> Option<Duration> {
    (min_fps.is_finite() && min_fps > 0.0).then(|| Duration::from_secs_f64(1.0 / min_fps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn stopped() -> Ticker {
        Ticker::new(TickerConfig { auto_start: false, ..TickerConfig::default() })
    }

    fn counter(ticker: &Ticker) -> (ListenerId, Rc<Cell<u32>>) {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = ticker.add_listener(Box::new(move |_| {
            h.set(h.get() + 1);
            ListenerControl::Continue
        }));
        (id, hits)
    }

    // ── start / stop ──────────────────────────────────────────────────────

    #[test]
    fn auto_start_by_default() {
        assert!(Ticker::default().is_started());
    }

    #[test]
    fn stopped_ticker_delivers_nothing() {
        let t = stopped();
        let (_, hits) = counter(&t);
        t.tick(1.0);
        t.update();
        assert_eq!(hits.get(), 0);
        assert_eq!(t.frame_count(), 0);
    }

    #[test]
    fn start_then_stop_pauses_delivery() {
        let t = stopped();
        let (_, hits) = counter(&t);
        t.start();
        t.tick(1.0);
        t.stop();
        t.tick(1.0);
        assert_eq!(hits.get(), 1);
    }

    // ── registry ──────────────────────────────────────────────────────────

    #[test]
    fn remove_listener_stops_delivery() {
        let t = Ticker::default();
        let (id, hits) = counter(&t);
        t.tick(1.0);
        t.remove_listener(id);
        t.tick(1.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(t.listener_count(), 0);
    }

    #[test]
    fn remove_unknown_listener_is_noop() {
        let t = Ticker::default();
        let (id, _) = counter(&t);
        t.remove_listener(id);
        t.remove_listener(id);
        assert_eq!(t.listener_count(), 0);
    }

    #[test]
    fn ids_are_unique() {
        let t = Ticker::default();
        let (a, _) = counter(&t);
        let (b, _) = counter(&t);
        assert_ne!(a, b);
    }

    // ── dispatch ──────────────────────────────────────────────────────────

    #[test]
    fn tick_carries_delta_speed_and_frame() {
        let t = Ticker::default();
        t.set_speed(0.5);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        t.add_listener(Box::new(move |tick| {
            s.borrow_mut().push(*tick);
            ListenerControl::Continue
        }));
        t.tick(2.0);
        t.tick(3.0);
        let seen = seen.borrow();
        assert_eq!(seen[0], Tick { delta: 2.0, speed: 0.5, frame: 0 });
        assert_eq!(seen[1], Tick { delta: 3.0, speed: 0.5, frame: 1 });
    }

    #[test]
    fn remove_control_deregisters() {
        let t = Ticker::default();
        t.add_listener(Box::new(|_| ListenerControl::Remove));
        t.tick(1.0);
        assert_eq!(t.listener_count(), 0);
    }

    #[test]
    fn remove_then_runs_after_deregistration() {
        let t = Ticker::default();
        let count_in_callback = Rc::new(Cell::new(usize::MAX));
        let c = count_in_callback.clone();
        let handle = t.clone();
        t.add_listener(Box::new(move |_| {
            let c = c.clone();
            let handle = handle.clone();
            ListenerControl::RemoveThen(Box::new(move || c.set(handle.listener_count())))
        }));
        t.tick(1.0);
        assert_eq!(count_in_callback.get(), 0);
    }

    #[test]
    fn listener_added_during_dispatch_runs_next_frame() {
        let t = Ticker::default();
        let late_hits = Rc::new(Cell::new(0));
        let handle = t.clone();
        let hits = late_hits.clone();
        t.add_listener(Box::new(move |_| {
            let hits = hits.clone();
            handle.add_listener(Box::new(move |_| {
                hits.set(hits.get() + 1);
                ListenerControl::Continue
            }));
            ListenerControl::Remove
        }));
        t.tick(1.0);
        assert_eq!(late_hits.get(), 0);
        t.tick(1.0);
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn listener_removed_during_dispatch_is_skipped() {
        let t = Ticker::default();
        let victim = Rc::new(Cell::new(None::<ListenerId>));
        let handle = t.clone();
        let v = victim.clone();
        t.add_listener(Box::new(move |_| {
            if let Some(id) = v.get() {
                handle.remove_listener(id);
            }
            ListenerControl::Continue
        }));
        let (id, hits) = counter(&t);
        victim.set(Some(id));
        t.tick(1.0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn speed_change_reaches_later_listeners_same_frame() {
        let t = Ticker::default();
        let handle = t.clone();
        t.add_listener(Box::new(move |_| {
            handle.set_speed(3.0);
            ListenerControl::Remove
        }));
        let seen = Rc::new(Cell::new(0.0));
        let s = seen.clone();
        t.add_listener(Box::new(move |tick| {
            s.set(tick.speed);
            ListenerControl::Remove
        }));
        t.tick(1.0);
        assert_eq!(seen.get(), 3.0);
    }

    #[test]
    fn reentrant_tick_skips_running_listener() {
        let t = Ticker::default();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let handle = t.clone();
        t.add_listener(Box::new(move |tick| {
            h.set(h.get() + 1);
            if tick.frame == 0 {
                handle.tick(1.0);
            }
            ListenerControl::Continue
        }));
        t.tick(1.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(t.frame_count(), 2);
    }

    // ── wall-clock driving ────────────────────────────────────────────────

    fn delta_after(t: &Ticker, start: Instant, elapsed: Duration) -> f64 {
        let seen = Rc::new(Cell::new(0.0));
        let s = seen.clone();
        t.add_listener(Box::new(move |tick| {
            s.set(tick.delta);
            ListenerControl::Remove
        }));
        t.update_at(start + elapsed);
        seen.get()
    }

    #[test]
    fn update_converts_seconds_to_frames() {
        let t = stopped();
        let t0 = Instant::now();
        t.start_at(t0);
        let delta = delta_after(&t, t0, Duration::from_millis(50));
        assert!((delta - 3.0).abs() < 1e-9);
    }

    #[test]
    fn update_scales_by_speed() {
        let t = Ticker::new(TickerConfig {
            speed: 2.0,
            auto_start: false,
            ..TickerConfig::default()
        });
        let t0 = Instant::now();
        t.start_at(t0);
        let delta = delta_after(&t, t0, Duration::from_millis(50));
        assert!((delta - 6.0).abs() < 1e-9);
    }

    #[test]
    fn update_clamps_to_min_fps() {
        let t = stopped();
        let t0 = Instant::now();
        t.start_at(t0);
        let delta = delta_after(&t, t0, Duration::from_secs(5));
        // 1 / 10 fps = 0.1 s = 6 frames.
        assert!((delta - 6.0).abs() < 1e-9);
    }

    #[test]
    fn restart_discards_paused_time() {
        let t = stopped();
        let t0 = Instant::now();
        t.start_at(t0);
        t.stop();
        let resume = t0 + Duration::from_secs(30);
        t.start_at(resume);
        let delta = delta_after(&t, resume, Duration::from_millis(50));
        assert!((delta - 3.0).abs() < 1e-9);
    }
}
