use crate::types::Config;
use anyhow::{bail, Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path}"))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("detection_confidence", self.detection.detection_confidence),
            ("tracking_confidence", self.detection.tracking_confidence),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                bail!("{name} must be in (0, 1], got {value}");
            }
        }
        if self.behavior.hand_face_distance <= 0.0 {
            bail!(
                "hand_face_distance must be positive, got {}",
                self.behavior.hand_face_distance
            );
        }
        if self.video.container_codec.chars().count() != 4 {
            bail!(
                "container_codec must be a four character fourcc, got {:?}",
                self.video.container_codec
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn sample_config() -> Config {
        Config {
            model: ModelConfig {
                path: "models/holistic.onnx".to_string(),
                input_width: 256,
                input_height: 256,
                num_threads: 2,
            },
            detection: DetectionConfig::default(),
            behavior: BehaviorConfig::default(),
            video: VideoConfig {
                input_dir: "videos".to_string(),
                output_dir: "output".to_string(),
                save_annotated: true,
                container_codec: "mp4v".to_string(),
                frames_dir: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_defaults_validate() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_confidence() {
        let mut config = sample_config();
        config.detection.detection_confidence = 0.0;
        assert!(config.validate().is_err());

        config.detection.detection_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_fourcc() {
        let mut config = sample_config();
        config.video.container_codec = "h264x".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_thresholds_default_from_partial_yaml() {
        let yaml = r#"
model:
  path: "models/holistic.onnx"
  input_width: 256
  input_height: 256
  num_threads: 2
detection: {}
behavior: {}
video:
  input_dir: "videos"
  output_dir: "output"
  save_annotated: false
logging:
  level: "info"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.detection.detection_confidence, 0.5);
        assert_eq!(config.detection.tracking_confidence, 0.5);
        assert_eq!(config.behavior.hand_face_distance, 0.15);
        assert_eq!(config.behavior.tension_ratio_threshold, 0.20);
        assert_eq!(config.video.container_codec, "mp4v");
    }
}
