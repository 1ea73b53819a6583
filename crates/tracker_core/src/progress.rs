use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of samples kept for the rate window.
pub const MAX_SAMPLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub at: Instant,
    pub units: f64,
}

/// Rolling progress history used when the server does not report an ETA.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressTracker {
    samples: VecDeque<ProgressSample>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, at: Instant, units: f64) {
        self.samples.push_back(ProgressSample { at, units });
        while self.samples.len() > MAX_SAMPLES {
            self.samples.pop_front();
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn samples(&self) -> impl Iterator<Item = &ProgressSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Remaining time until `total` units, from the rate across the window.
    ///
    /// Returns `None` unless the newest sample advanced over the one before it.
    pub fn estimate(&self, total: f64) -> Option<Duration> {
        let newest = *self.samples.back()?;
        let previous = *self.samples.get(self.samples.len().checked_sub(2)?)?;
        if newest.units <= previous.units {
            return None;
        }

        let oldest = *self.samples.front()?;
        let elapsed = newest.at.checked_duration_since(oldest.at)?.as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }
        let rate = (newest.units - oldest.units) / elapsed;
        if !rate.is_finite() || rate <= 0.0 {
            return None;
        }

        let remaining = (total - newest.units).max(0.0) / rate;
        Duration::try_from_secs_f64(remaining).ok()
    }
}

/// `MM:SS` below one hour, `H:MM:SS` above.
pub fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
