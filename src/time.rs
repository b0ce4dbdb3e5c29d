//! Frame clock for the auto-damage loop.
//!
//! `requestAnimationFrame` fires at ~60fps with a variable delta. FrameClock
//! turns successive frame timestamps into the elapsed seconds that a
//! `Tick` action carries. The core never reads the clock itself.

/// Largest gap (ms) credited to a single frame. Longer gaps happen when the
/// tab is backgrounded and would otherwise land as one huge damage burst.
pub const DEFAULT_MAX_FRAME_MS: f64 = 1000.0;

pub struct FrameClock {
    /// Upper bound for one frame's delta in milliseconds.
    max_frame_ms: f64,
    /// Timestamp of the last update (ms), None before the first frame.
    last_timestamp: Option<f64>,
}

impl FrameClock {
    pub fn new(max_frame_ms: f64) -> Self {
        Self {
            max_frame_ms,
            last_timestamp: None,
        }
    }

    /// Feed a wall-clock timestamp (from `performance.now()` or similar) and
    /// get back the seconds elapsed since the previous frame.
    pub fn update(&mut self, now_ms: f64) -> f64 {
        let delta_ms = match self.last_timestamp {
            Some(prev) => (now_ms - prev).clamp(0.0, self.max_frame_ms),
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);

        delta_ms / 1000.0
    }

    /// Forget the previous timestamp, e.g. after the loop was paused.
    pub fn reset(&mut self) {
        self.last_timestamp = None;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_MS)
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
