// src/error.rs
//
// Error taxonomy for the video pipeline. Fatal errors abort the run;
// FrameProcessing is the one recoverable variant — the orchestrator logs
// it, skips the frame, and keeps streaming.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to open video container {path}: {reason}")]
    OpenFailed { path: String, reason: anyhow::Error },

    #[error("invalid video metadata (fps={fps}, width={width}, height={height})")]
    InvalidMetadata { fps: f64, width: i32, height: i32 },

    #[error("frame {index} could not be processed: {reason}")]
    FrameProcessing { index: u64, reason: anyhow::Error },

    #[error("sink expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    DimensionMismatch {
        expected_width: i32,
        expected_height: i32,
        actual_width: i32,
        actual_height: i32,
    },
}

impl PipelineError {
    /// Only per-frame processing errors may be skipped; everything else
    /// tears the run down.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::FrameProcessing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_frame_errors_are_recoverable() {
        let err = PipelineError::FrameProcessing {
            index: 7,
            reason: anyhow::anyhow!("estimator hiccup"),
        };
        assert!(err.is_recoverable());

        let err = PipelineError::InvalidMetadata {
            fps: 0.0,
            width: 640,
            height: 480,
        };
        assert!(!err.is_recoverable());

        let err = PipelineError::DimensionMismatch {
            expected_width: 640,
            expected_height: 480,
            actual_width: 640,
            actual_height: 478,
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_display_carries_the_offending_values() {
        let err = PipelineError::InvalidMetadata {
            fps: 0.0,
            width: 640,
            height: 0,
        };
        let msg = err.to_string();
        assert!(msg.contains("fps=0"));
        assert!(msg.contains("height=0"));
    }
}
