use prometheus::Histogram;
use std::time::{Duration, Instant};

/// Times one collection pass and records it into the pass-duration histogram
/// when dropped. A discarded pass records nothing.
pub struct PassTimer {
    start: Instant,
    histogram: Option<Histogram>,
}

impl PassTimer {
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram: Some(histogram),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Drop without recording, for passes whose result was thrown away
    pub fn discard(mut self) {
        self.histogram = None;
    }
}

impl Drop for PassTimer {
    fn drop(&mut self) {
        if let Some(histogram) = self.histogram.take() {
            histogram.observe(self.start.elapsed().as_secs_f64());
        }
    }
}
