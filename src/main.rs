// src/main.rs

mod analyzer;
mod annotator;
mod config;
mod error;
mod extraction;
mod landmarks;
mod pipeline;
mod preprocessing;
mod types;
mod video_sink;
mod video_source;

use anyhow::{Context, Result};
use landmarks::HolisticEstimator;
use pipeline::PipelineOrchestrator;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use types::Config;
use walkdir::WalkDir;

fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    let filter = EnvFilter::try_new(&config.logging.level)
        .with_context(|| format!("invalid logging.level filter {:?}", config.logging.level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🎬 Tension Detection Pipeline Starting");
    info!("✓ Configuration loaded");

    info!(
        "Behavior thresholds: hand-face distance={:.2}, tension ratio={:.2}",
        config.behavior.hand_face_distance, config.behavior.tension_ratio_threshold
    );

    let videos = find_video_files(&config.video.input_dir)?;
    if videos.is_empty() {
        error!("No video files found in {}", config.video.input_dir);
        return Ok(());
    }

    std::fs::create_dir_all(&config.video.output_dir)?;

    let mut failures = 0usize;
    for video in &videos {
        if let Err(e) = process_video(&config, video) {
            error!("Processing failed for {}: {e:#}", video.display());
            failures += 1;
        }
    }

    info!(
        "✓ Batch done: {} videos, {} failed",
        videos.len(),
        failures
    );
    Ok(())
}

fn process_video(config: &Config, video: &Path) -> Result<()> {
    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");

    // Side channel: dump raw decoded frames when requested
    if let Some(frames_dir) = &config.video.frames_dir {
        let frame_dir = Path::new(frames_dir).join(stem);
        let count = extraction::extract_frames(video, &frame_dir)?;
        info!("Frame extraction wrote {count} images");
    }

    let output = config.video.save_annotated.then(|| {
        PathBuf::from(&config.video.output_dir).join(format!("{stem}_annotated.mp4"))
    });

    // One estimator per run; session resources go away with the orchestrator
    let estimator = HolisticEstimator::new(&config.model, &config.detection)?;
    let mut orchestrator = PipelineOrchestrator::new(config.clone(), estimator);
    let outcome = orchestrator.run(video, output.as_deref());

    match outcome.summary {
        Some(summary) => {
            let json =
                serde_json::to_string(&summary).context("failed to serialize summary")?;
            info!("Behavior summary for {}: {json}", video.display());
            Ok(())
        }
        None => anyhow::bail!("pipeline did not produce a summary"),
    }
}

fn find_video_files(input_dir: &str) -> Result<Vec<PathBuf>> {
    let mut videos = Vec::new();

    for entry in WalkDir::new(input_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && is_video_file(path) {
            videos.push(path.to_path_buf());
        }
    }

    videos.sort();
    info!("Found {} video files", videos.len());
    Ok(videos)
}

fn is_video_file(path: &Path) -> bool {
    const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_level_drives_the_tracing_filter() {
        // The shipped default and a terse override both parse
        assert!(EnvFilter::try_new("tension_detection=info,ort=warn").is_ok());
        assert!(EnvFilter::try_new("debug").is_ok());
        // A malformed directive is rejected instead of silently ignored
        assert!(EnvFilter::try_new("tension_detection=notalevel").is_err());
    }

    #[test]
    fn test_video_extension_matching_is_case_insensitive() {
        assert!(is_video_file(Path::new("clip.mp4")));
        assert!(is_video_file(Path::new("clip.MOV")));
        assert!(is_video_file(Path::new("dir/clip.Mkv")));
        assert!(!is_video_file(Path::new("clip.wav")));
        assert!(!is_video_file(Path::new("clip")));
    }
}
