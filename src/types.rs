use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub detection: DetectionConfig,
    pub behavior: BehaviorConfig,
    pub video: VideoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: String,
    pub input_width: usize,
    pub input_height: usize,
    pub num_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_confidence")]
    pub detection_confidence: f32,
    #[serde(default = "default_confidence")]
    pub tracking_confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Normalized wrist-to-nose distance below which a frame counts as tense
    #[serde(default = "default_hand_face_distance")]
    pub hand_face_distance: f32,
    /// Tension ratio above which the whole video is interpreted as Tense
    #[serde(default = "default_tension_ratio_threshold")]
    pub tension_ratio_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub save_annotated: bool,
    #[serde(default = "default_codec")]
    pub container_codec: String,
    /// When set, every decoded frame is also written as a numbered JPEG here
    #[serde(default)]
    pub frames_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_confidence() -> f32 {
    0.5
}

fn default_hand_face_distance() -> f32 {
    0.15
}

fn default_tension_ratio_threshold() -> f64 {
    0.20
}

fn default_codec() -> String {
    "mp4v".to_string()
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            detection_confidence: default_confidence(),
            tracking_confidence: default_confidence(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            hand_face_distance: default_hand_face_distance(),
            tension_ratio_threshold: default_tension_ratio_threshold(),
        }
    }
}

/// One decoded raster, RGB, even-cropped dimensions.
///
/// Identified only by its ordinal position in the stream; never retained
/// past one pipeline step.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub index: u64,
    pub timestamp_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Interpretation {
    Calm,
    Tense,
}

/// Immutable per-run result handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehaviorSummary {
    pub total_frames: u64,
    pub tension_frames: u64,
    pub tension_ratio: f64,
    pub interpretation: Interpretation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpretation_serializes_as_plain_string() {
        assert_eq!(
            serde_json::to_string(&Interpretation::Tense).unwrap(),
            "\"Tense\""
        );
        assert_eq!(
            serde_json::to_string(&Interpretation::Calm).unwrap(),
            "\"Calm\""
        );
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = BehaviorSummary {
            total_frames: 10,
            tension_frames: 5,
            tension_ratio: 0.5,
            interpretation: Interpretation::Tense,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_frames"], 10);
        assert_eq!(json["tension_frames"], 5);
        assert_eq!(json["interpretation"], "Tense");
    }
}
