// src/pipeline/metrics.rs
//
// Per-run observability. Skipped-by-error frames are tracked separately
// from frames excluded by policy (no pose), so an unhealthy estimator is
// distinguishable from a video where nobody is on screen.

use std::time::Instant;
use tracing::info;

#[derive(Debug)]
pub struct PipelineMetrics {
    pub frames_decoded: u64,
    pub frames_eligible: u64,
    pub frames_tension: u64,
    pub frames_skipped: u64,
    pub frames_written: u64,
    started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            frames_decoded: 0,
            frames_eligible: 0,
            frames_tension: 0,
            frames_skipped: 0,
            frames_written: 0,
            started_at: Instant::now(),
        }
    }

    /// Decoded frames per wall-clock second
    pub fn fps(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            self.frames_decoded as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        info!(
            frames_decoded = self.frames_decoded,
            frames_eligible = self.frames_eligible,
            frames_tension = self.frames_tension,
            frames_skipped = self.frames_skipped,
            frames_written = self.frames_written,
            fps = self.fps(),
            "pipeline run finished"
        );
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
