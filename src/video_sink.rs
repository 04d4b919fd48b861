// src/video_sink.rs

use crate::error::PipelineError;
use anyhow::{Context, Result};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::{VideoWriter, VideoWriterTrait},
};
use std::path::Path;
use tracing::info;

/// Write side of the annotated output container. Dimensions are fixed at
/// open; a frame of any other size is an internal invariant violation and
/// fails the run rather than being silently resized.
pub struct VideoSink {
    writer: VideoWriter,
    path: String,
    width: i32,
    height: i32,
    frames_written: u64,
}

impl VideoSink {
    pub fn open(
        path: &Path,
        fps: f64,
        width: i32,
        height: i32,
        codec: &str,
    ) -> Result<Self, PipelineError> {
        let path_str = path.display().to_string();
        let open_failed = |reason: anyhow::Error| PipelineError::OpenFailed {
            path: path_str.clone(),
            reason,
        };

        let fourcc = fourcc_from_str(codec).map_err(&open_failed)?;
        let writer = VideoWriter::new(
            &path.to_string_lossy(),
            fourcc,
            fps,
            Size::new(width, height),
            true,
        )
        .map_err(|e| open_failed(e.into()))?;

        let opened = writer.is_opened().map_err(|e| open_failed(e.into()))?;
        if !opened {
            return Err(open_failed(anyhow::anyhow!(
                "encoder rejected codec {codec:?} at {width}x{height}"
            )));
        }

        info!(
            "Output video: {} ({codec}, {}x{})",
            path.display(),
            width,
            height
        );

        Ok(Self {
            writer,
            path: path_str,
            width,
            height,
            frames_written: 0,
        })
    }

    pub fn write(&mut self, frame: &Mat) -> Result<(), PipelineError> {
        if frame.cols() != self.width || frame.rows() != self.height {
            return Err(PipelineError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: frame.cols(),
                actual_height: frame.rows(),
            });
        }

        // Encoder write failures are container-level, hence fatal
        VideoWriterTrait::write(&mut self.writer, frame).map_err(|e| {
            PipelineError::OpenFailed {
                path: self.path.clone(),
                reason: anyhow::Error::from(e).context("encoder write failed"),
            }
        })?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush and close the container. Also called from Drop, but the
    /// orchestrator releases explicitly so encoder errors are not lost.
    pub fn release(&mut self) -> Result<()> {
        VideoWriterTrait::release(&mut self.writer).context("failed to finalize output video")
    }
}

fn fourcc_from_str(codec: &str) -> Result<i32> {
    let chars: Vec<char> = codec.chars().collect();
    anyhow::ensure!(
        chars.len() == 4,
        "codec must be a four character fourcc, got {codec:?}"
    );
    VideoWriter::fourcc(chars[0], chars[1], chars[2], chars[3])
        .with_context(|| format!("invalid fourcc {codec:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_requires_four_chars() {
        assert!(fourcc_from_str("mp4").is_err());
        assert!(fourcc_from_str("mp4vx").is_err());
        assert!(fourcc_from_str("mp4v").is_ok());
        assert!(fourcc_from_str("XVID").is_ok());
    }
}
