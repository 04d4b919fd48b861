// src/landmarks/mod.rs
//
// Holistic landmark model: four channels (pose, left hand, right hand,
// face), each either absent or a full fixed-size set of normalized points.
// The estimator itself is a capability behind a trait so the pipeline can
// run against synthetic landmark fixtures without a model or a video file.

pub mod holistic;
pub mod schema;

pub use holistic::HolisticEstimator;

use crate::types::Frame;
use anyhow::Result;

/// A normalized image-relative point, [0,1] on both axes. `z` is relative
/// depth where the channel provides it, `visibility` the model's belief the
/// point is unoccluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: 1.0,
        }
    }

    /// Euclidean distance to another landmark in the normalized image plane
    pub fn plane_distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Per-frame estimation result. A present channel always carries its
/// channel's full schema-sized point sequence.
#[derive(Debug, Clone, Default)]
pub struct LandmarkSet {
    pub pose: Option<Vec<Landmark>>,
    pub left_hand: Option<Vec<Landmark>>,
    pub right_hand: Option<Vec<Landmark>>,
    pub face: Option<Vec<Landmark>>,
}

impl LandmarkSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The nose from the pose channel, when a pose is present. The nose is
    /// addressed by its named schema index, never assumed to be point 0.
    pub fn nose(&self) -> Option<&Landmark> {
        self.pose
            .as_deref()
            .and_then(|points| points.get(schema::PoseLandmark::Nose as usize))
    }
}

/// Capability contract over the external holistic estimator. Implementations
/// may keep internal state across frames (temporal tracking) but expose
/// nothing beyond the current frame's result. One instance per video run.
pub trait LandmarkEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<LandmarkSet>;
}
