// src/analyzer.rs
//
// Tension heuristic: how often a hand sits close to the face, measured as
// wrist-to-nose distance in normalized image coordinates. Frames without a
// pose are excluded from both counters — tension is only meaningful
// relative to a visible pose.

use crate::landmarks::schema::HAND_WRIST;
use crate::landmarks::LandmarkSet;
use crate::types::{BehaviorConfig, BehaviorSummary, Interpretation};

/// What a single frame contributed to the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    /// No pose landmarks; frame excluded from both counters
    Excluded,
    /// Pose present, no hand near the face
    Eligible,
    /// Pose present and at least one wrist within the distance threshold
    Tension,
}

/// Stateful per-run aggregator. Fed once per frame, finalized exactly once
/// at end of stream.
pub struct BehaviorAnalyzer {
    config: BehaviorConfig,
    total_frames: u64,
    tension_frames: u64,
}

impl BehaviorAnalyzer {
    pub fn new(config: BehaviorConfig) -> Self {
        Self {
            config,
            total_frames: 0,
            tension_frames: 0,
        }
    }

    pub fn observe(&mut self, landmarks: &LandmarkSet) -> FrameClass {
        let Some(nose) = landmarks.nose() else {
            return FrameClass::Excluded;
        };

        self.total_frames += 1;

        let hand_near_face = [&landmarks.left_hand, &landmarks.right_hand]
            .into_iter()
            .flatten()
            .filter_map(|points| points.get(HAND_WRIST))
            .any(|wrist| nose.plane_distance(wrist) < self.config.hand_face_distance);

        if hand_near_face {
            // At most one increment per frame, even when both hands qualify
            self.tension_frames += 1;
            FrameClass::Tension
        } else {
            FrameClass::Eligible
        }
    }

    pub fn finalize(self) -> BehaviorSummary {
        let tension_ratio = if self.total_frames > 0 {
            round2(self.tension_frames as f64 / self.total_frames as f64)
        } else {
            0.0
        };

        let interpretation = if tension_ratio > self.config.tension_ratio_threshold {
            Interpretation::Tense
        } else {
            Interpretation::Calm
        };

        BehaviorSummary {
            total_frames: self.total_frames,
            tension_frames: self.tension_frames,
            tension_ratio,
            interpretation,
        }
    }
}

/// Two-decimal rounding with ties to even, matching how the summary was
/// historically reported
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
