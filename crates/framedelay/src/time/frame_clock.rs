use std::time::{Duration, Instant};

/// Wall-clock measurement for one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Clamped seconds since the previous measurement.
    pub dt: f64,

    /// Timestamp the measurement was taken at.
    pub now: Instant,

    /// Index of this frame, starting at zero.
    pub frame_index: u64,
}

/// Measures clamped wall-clock deltas between frames.
///
/// The lower clamp keeps tight loops from reporting a zero delta. The upper
/// clamp keeps a long stall (debugger, minimized window) from arriving as one
/// giant step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a clock with a 0.1 ms floor and a 100 ms ceiling (10 fps).
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(100))
    }

    /// Creates a clock with custom delta clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        Self::starting_at(Instant::now(), dt_min, dt_max)
    }

    /// Creates a clock whose baseline is `start` rather than "now".
    pub fn starting_at(start: Instant, dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: start,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    pub fn dt_max(&self) -> Duration {
        self.dt_max
    }

    /// Replaces the upper clamp.
    pub fn set_dt_max(&mut self, dt_max: Duration) {
        self.dt_max = dt_max.max(self.dt_min);
    }

    /// Moves the baseline to now.
    ///
    /// Call when resuming so the paused interval is not measured.
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.last = now;
    }

    /// Measures the time since the previous tick.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Same as [`tick`](Self::tick) with an explicit timestamp.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f64(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(start: Instant) -> FrameClock {
        FrameClock::starting_at(start, Duration::from_millis(1), Duration::from_millis(100))
    }

    #[test]
    fn measures_elapsed_time() {
        let t0 = Instant::now();
        let mut c = clock(t0);
        let ft = c.tick_at(t0 + Duration::from_millis(16));
        assert!((ft.dt - 0.016).abs() < 1e-9);
        assert_eq!(ft.frame_index, 0);
    }

    #[test]
    fn clamps_long_stall() {
        let t0 = Instant::now();
        let mut c = clock(t0);
        let ft = c.tick_at(t0 + Duration::from_secs(5));
        assert!((ft.dt - 0.1).abs() < 1e-9);
    }

    #[test]
    fn clamps_zero_delta() {
        let t0 = Instant::now();
        let mut c = clock(t0);
        let ft = c.tick_at(t0);
        assert!((ft.dt - 0.001).abs() < 1e-9);
    }

    #[test]
    fn frame_index_increments() {
        let t0 = Instant::now();
        let mut c = clock(t0);
        c.tick_at(t0 + Duration::from_millis(10));
        let ft = c.tick_at(t0 + Duration::from_millis(20));
        assert_eq!(ft.frame_index, 1);
    }

    #[test]
    fn reset_discards_paused_interval() {
        let t0 = Instant::now();
        let mut c = clock(t0);
        c.reset_at(t0 + Duration::from_secs(10));
        let ft = c.tick_at(t0 + Duration::from_secs(10) + Duration::from_millis(20));
        assert!((ft.dt - 0.020).abs() < 1e-9);
    }

    #[test]
    fn set_dt_max_never_drops_below_min() {
        let mut c = clock(Instant::now());
        c.set_dt_max(Duration::ZERO);
        assert_eq!(c.dt_max(), Duration::from_millis(1));
    }
}
