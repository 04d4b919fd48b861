// src/landmarks/holistic.rs
//
// ONNX-backed holistic estimator. The model is consumed as an opaque
// capability: one RGB frame in, four landmark channels out. Expected
// outputs, in order:
//   0: pose       [1, 33, 4]   (x, y, z, visibility)
//   1: face       [1, 468, 3]
//   2: left_hand  [1, 21, 3]
//   3: right_hand [1, 21, 3]
//   4: presence   [1, 4]       per-channel confidence, same order
//
// A channel is reported present when its presence score clears the
// detection threshold, or the (usually lower) tracking threshold when the
// channel was already present on the previous frame.

use super::schema::{FACE_LANDMARK_COUNT, HAND_LANDMARK_COUNT, POSE_LANDMARK_COUNT};
use super::{Landmark, LandmarkEstimator, LandmarkSet};
use crate::preprocessing;
use crate::types::{DetectionConfig, Frame, ModelConfig};
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::{debug, info};

const CHANNELS: usize = 4;

pub struct HolisticEstimator {
    session: Session,
    model: ModelConfig,
    detection_confidence: f32,
    tracking_confidence: f32,
    // pose, face, left hand, right hand — presence on the previous frame
    tracked: [bool; CHANNELS],
}

impl HolisticEstimator {
    pub fn new(model: &ModelConfig, detection: &DetectionConfig) -> Result<Self> {
        info!("Initializing holistic estimator");
        info!("Model path: {}", model.path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(model.num_threads)?
            .with_inter_threads(1)?
            .commit_from_file(&model.path)
            .context("Failed to load holistic model")?;

        info!("✓ Holistic estimator ready");

        Ok(Self {
            session,
            model: model.clone(),
            detection_confidence: detection.detection_confidence,
            tracking_confidence: detection.tracking_confidence,
            tracked: [false; CHANNELS],
        })
    }

}

impl LandmarkEstimator for HolisticEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<LandmarkSet> {
        let input = preprocessing::preprocess(
            &frame.data,
            frame.width,
            frame.height,
            self.model.input_width,
            self.model.input_height,
        )?;

        let shape = [1usize, 3, self.model.input_height, self.model.input_width];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.into_boxed_slice()))?;

        // Thresholds decided before the run so tracking state can be
        // committed after the output borrow ends
        let detect = self.detection_confidence;
        let track = self.tracking_confidence.min(self.detection_confidence);
        let prior = self.tracked;

        let outputs = self.session.run(ort::inputs!["image" => input_value])?;
        anyhow::ensure!(
            outputs.len() >= 5,
            "holistic model produced {} outputs, expected 5",
            outputs.len()
        );

        let (_, presence) = outputs[4].try_extract_tensor::<f32>()?;
        anyhow::ensure!(
            presence.len() >= CHANNELS,
            "presence tensor has {} scores, expected {CHANNELS}",
            presence.len()
        );

        let mut set = LandmarkSet::empty();
        let channel_shapes: [(usize, usize, usize); CHANNELS] = [
            (0, POSE_LANDMARK_COUNT, 4),
            (1, FACE_LANDMARK_COUNT, 3),
            (2, HAND_LANDMARK_COUNT, 3),
            (3, HAND_LANDMARK_COUNT, 3),
        ];

        let mut now_present = [false; CHANNELS];
        for (idx, count, stride) in channel_shapes {
            let threshold = if prior[idx] { track } else { detect };
            let present = presence[idx] >= threshold;
            now_present[idx] = present;
            if !present {
                continue;
            }

            let (_, data) = outputs[idx].try_extract_tensor::<f32>()?;
            let points = parse_channel(data, count, stride)?;
            match idx {
                0 => set.pose = Some(points),
                1 => set.face = Some(points),
                2 => set.left_hand = Some(points),
                _ => set.right_hand = Some(points),
            }
        }
        self.tracked = now_present;

        debug!(
            frame = frame.index,
            pose = set.pose.is_some(),
            face = set.face.is_some(),
            left_hand = set.left_hand.is_some(),
            right_hand = set.right_hand.is_some(),
            "holistic estimation done"
        );

        Ok(set)
    }
}

fn parse_channel(data: &[f32], count: usize, stride: usize) -> Result<Vec<Landmark>> {
    anyhow::ensure!(
        data.len() >= count * stride,
        "channel tensor has {} values, expected {}",
        data.len(),
        count * stride
    );

    let points = data
        .chunks_exact(stride)
        .take(count)
        .map(|chunk| Landmark {
            x: chunk[0],
            y: chunk[1],
            z: chunk[2],
            visibility: if stride > 3 { chunk[3] } else { 1.0 },
        })
        .collect();

    Ok(points)
}
