// Debounced container size tracking for sparklines
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);
const RESIZE_TOLERANCE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 100,
            height: 40,
        }
    }
}

impl Viewport {
    fn differs_from(&self, other: &Viewport) -> bool {
        self.width.abs_diff(other.width) > RESIZE_TOLERANCE
            || self.height.abs_diff(other.height) > RESIZE_TOLERANCE
    }
}

/// Collapses a burst of resize observations into a single update once the
/// container has been quiet for the debounce window.
#[derive(Debug, Clone)]
pub struct ViewportTracker {
    current: Viewport,
    pending: Option<(Viewport, Instant)>,
    quiet: Duration,
}

impl Default for ViewportTracker {
    fn default() -> Self {
        Self::new(Viewport::default(), RESIZE_DEBOUNCE)
    }
}

impl ViewportTracker {
    pub fn new(initial: Viewport, quiet: Duration) -> Self {
        Self {
            current: initial,
            pending: None,
            quiet,
        }
    }

    /// Record an observed container size. Each observation restarts the window.
    pub fn observe(&mut self, width: f64, height: f64, now: Instant) {
        let observed = Viewport {
            width: floor_units(width),
            height: floor_units(height),
        };
        self.pending = Some((observed, now));
    }

    /// Apply a pending size whose window has elapsed and return the settled size
    pub fn settle(&mut self, now: Instant) -> Viewport {
        if let Some((observed, at)) = self.pending {
            if now.saturating_duration_since(at) >= self.quiet {
                self.pending = None;
                if observed.differs_from(&self.current) {
                    tracing::debug!(
                        "Viewport resized {}x{} -> {}x{}",
                        self.current.width,
                        self.current.height,
                        observed.width,
                        observed.height
                    );
                    self.current = observed;
                }
            }
        }
        self.current
    }
}

fn floor_units(v: f64) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.floor().min(u32::MAX as f64) as u32
    } else {
        0
    }
}
