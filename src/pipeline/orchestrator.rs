// src/pipeline/orchestrator.rs
//
// Drives one video through source -> estimator -> annotator/analyzer ->
// sink, strictly in frame order. State machine:
//
//   Idle -> Opened -> Streaming -> Finalized
//                 \-> Failed  <--/
//
// A failure isolated to one frame (estimation or annotation) is logged
// and the frame skipped — it contributes to neither aggregation nor the
// output container. Container-level failures are fatal. One orchestrator,
// one estimator, one run; the orchestrator is not restartable.

use super::metrics::PipelineMetrics;
use crate::analyzer::{BehaviorAnalyzer, FrameClass};
use crate::annotator;
use crate::error::PipelineError;
use crate::landmarks::LandmarkEstimator;
use crate::types::{BehaviorSummary, Config, Frame};
use crate::video_sink::VideoSink;
use crate::video_source::VideoSource;
use std::path::Path;
use tracing::{error, info, warn};

const PROGRESS_LOG_INTERVAL: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Opened,
    Streaming,
    Finalized,
    Failed,
}

/// Overall verdict for one run. On failure no summary is produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub success: bool,
    pub summary: Option<BehaviorSummary>,
    /// Frames dropped by the skip-and-continue policy, distinct from
    /// frames excluded because no pose was visible
    pub frames_skipped: u64,
}

pub struct PipelineOrchestrator<E: LandmarkEstimator> {
    config: Config,
    estimator: E,
    state: PipelineState,
}

impl<E: LandmarkEstimator> PipelineOrchestrator<E> {
    pub fn new(config: Config, estimator: E) -> Self {
        Self {
            config,
            estimator,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Process `input` end to end. When `output` is given, annotated frames
    /// are re-encoded there at the source's frame rate and even-adjusted
    /// dimensions; otherwise annotation is still computed and discarded.
    pub fn run(&mut self, input: &Path, output: Option<&Path>) -> PipelineOutcome {
        if self.state != PipelineState::Idle {
            error!("pipeline orchestrator is single-use, refusing second run");
            self.state = PipelineState::Failed;
            return PipelineOutcome {
                success: false,
                summary: None,
                frames_skipped: 0,
            };
        }

        match self.run_inner(input, output) {
            Ok((summary, metrics)) => {
                self.state = PipelineState::Finalized;
                PipelineOutcome {
                    success: true,
                    summary: Some(summary),
                    frames_skipped: metrics.frames_skipped,
                }
            }
            Err(err) => {
                // Source, sink, and estimator are all run-scoped locals or
                // owned fields; Drop releases them on this path.
                error!("pipeline failed: {err:#}");
                self.state = PipelineState::Failed;
                PipelineOutcome {
                    success: false,
                    summary: None,
                    frames_skipped: 0,
                }
            }
        }
    }

    fn run_inner(
        &mut self,
        input: &Path,
        output: Option<&Path>,
    ) -> Result<(BehaviorSummary, PipelineMetrics), PipelineError> {
        let mut source = VideoSource::open(input)?;
        self.state = PipelineState::Opened;

        let mut sink = match output {
            Some(path) => Some(VideoSink::open(
                path,
                source.fps,
                source.width,
                source.height,
                &self.config.video.container_codec,
            )?),
            None => None,
        };

        let mut analyzer = BehaviorAnalyzer::new(self.config.behavior.clone());
        let mut metrics = PipelineMetrics::new();
        self.state = PipelineState::Streaming;

        loop {
            let frame = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                // Read failures are container-level, not per-frame
                Err(e) => {
                    return Err(PipelineError::OpenFailed {
                        path: input.display().to_string(),
                        reason: e.context("container read failed mid-stream"),
                    })
                }
            };

            metrics.frames_decoded += 1;
            if frame.index > 0 && frame.index % PROGRESS_LOG_INTERVAL == 0 {
                info!(
                    "Processed {} frames ({:.1}%, t={:.1}s)",
                    frame.index,
                    source.progress(),
                    frame.timestamp_ms / 1000.0
                );
            }

            if let Err(err) =
                self.process_frame(&frame, &mut analyzer, &mut metrics, sink.as_mut())
            {
                if err.is_recoverable() {
                    // Skipped frames contribute to neither aggregation nor
                    // the output container
                    warn!("skipping frame: {err}");
                    metrics.frames_skipped += 1;
                } else {
                    return Err(err);
                }
            }
        }

        if let Some(mut sink) = sink.take() {
            metrics.frames_written = sink.frames_written();
            sink.release().map_err(|e| PipelineError::OpenFailed {
                path: input.display().to_string(),
                reason: e,
            })?;
        }

        metrics.log_summary();
        Ok((analyzer.finalize(), metrics))
    }

    fn process_frame(
        &mut self,
        frame: &Frame,
        analyzer: &mut BehaviorAnalyzer,
        metrics: &mut PipelineMetrics,
        sink: Option<&mut VideoSink>,
    ) -> Result<(), PipelineError> {
        let frame_error = |reason: anyhow::Error| PipelineError::FrameProcessing {
            index: frame.index,
            reason,
        };

        let landmarks = self.estimator.estimate(frame).map_err(frame_error)?;

        // Annotation runs whether or not a sink is configured; behavior
        // analysis and drawing are independent consumers of the same
        // landmark set.
        let annotated = annotator::annotate(frame, &landmarks).map_err(frame_error)?;

        match analyzer.observe(&landmarks) {
            FrameClass::Excluded => {}
            FrameClass::Eligible => metrics.frames_eligible += 1,
            FrameClass::Tension => {
                metrics.frames_eligible += 1;
                metrics.frames_tension += 1;
            }
        }

        if let Some(sink) = sink {
            sink.write(&annotated)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::schema::POSE_LANDMARK_COUNT;
    use crate::landmarks::{Landmark, LandmarkSet};
    use crate::types::*;
    use opencv::core::{Mat, Scalar, CV_8UC3};

    struct NeverCalledEstimator;

    impl LandmarkEstimator for NeverCalledEstimator {
        fn estimate(&mut self, _frame: &crate::types::Frame) -> anyhow::Result<LandmarkSet> {
            panic!("estimator must not be called when the source fails to open");
        }
    }

    fn test_config() -> Config {
        Config {
            model: ModelConfig {
                path: "unused.onnx".to_string(),
                input_width: 256,
                input_height: 256,
                num_threads: 1,
            },
            detection: DetectionConfig::default(),
            behavior: BehaviorConfig::default(),
            video: VideoConfig {
                input_dir: ".".to_string(),
                output_dir: ".".to_string(),
                save_annotated: false,
                container_codec: "mp4v".to_string(),
                frames_dir: None,
            },
            logging: LoggingConfig {
                level: "warn".to_string(),
            },
        }
    }

    #[test]
    fn test_unopenable_input_fails_before_any_frame() {
        let mut orchestrator = PipelineOrchestrator::new(test_config(), NeverCalledEstimator);
        assert_eq!(orchestrator.state(), PipelineState::Idle);

        let outcome = orchestrator.run(Path::new("no/such/video.mp4"), None);
        assert!(!outcome.success);
        assert!(outcome.summary.is_none());
        assert_eq!(orchestrator.state(), PipelineState::Failed);
    }

    #[test]
    fn test_orchestrator_is_single_use() {
        let mut orchestrator = PipelineOrchestrator::new(test_config(), NeverCalledEstimator);
        let _ = orchestrator.run(Path::new("no/such/video.mp4"), None);

        let outcome = orchestrator.run(Path::new("no/such/video.mp4"), None);
        assert!(!outcome.success);
    }

    /// Fails on one specific frame, returns a full pose for the rest
    struct FlakyEstimator {
        failing_index: u64,
    }

    impl LandmarkEstimator for FlakyEstimator {
        fn estimate(&mut self, frame: &Frame) -> anyhow::Result<LandmarkSet> {
            if frame.index == self.failing_index {
                anyhow::bail!("transient estimation failure");
            }
            Ok(LandmarkSet {
                pose: Some(vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT]),
                ..Default::default()
            })
        }
    }

    /// Encode a short solid-color MJPG/AVI clip for the source to decode
    fn write_test_clip(path: &Path, frames: usize) {
        let mut sink = crate::video_sink::VideoSink::open(path, 10.0, 16, 16, "MJPG").unwrap();
        let mat =
            Mat::new_rows_cols_with_default(16, 16, CV_8UC3, Scalar::new(90.0, 90.0, 90.0, 0.0))
                .unwrap();
        for _ in 0..frames {
            sink.write(&mat).unwrap();
        }
        sink.release().unwrap();
    }

    #[test]
    fn test_frame_failure_is_skipped_and_run_still_succeeds() {
        let clip = std::env::temp_dir().join("tension-detection-flaky-frame.avi");
        write_test_clip(&clip, 4);

        let estimator = FlakyEstimator { failing_index: 1 };
        let mut orchestrator = PipelineOrchestrator::new(test_config(), estimator);
        let outcome = orchestrator.run(&clip, None);
        let _ = std::fs::remove_file(&clip);

        assert!(outcome.success);
        assert_eq!(orchestrator.state(), PipelineState::Finalized);
        assert_eq!(outcome.frames_skipped, 1);

        // The failed frame contributes to neither counter
        let summary = outcome.summary.unwrap();
        assert_eq!(summary.total_frames, 3);
        assert_eq!(summary.tension_frames, 0);
        assert_eq!(summary.interpretation, Interpretation::Calm);
    }
}
