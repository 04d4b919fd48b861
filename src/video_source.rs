// src/video_source.rs

use crate::error::PipelineError;
use crate::types::Frame;
use anyhow::Result;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};
use std::path::Path;
use tracing::info;

/// Read side of a video container. Metadata is read once at open; width
/// and height are forced even (encoder requirement), and a source whose
/// fps, width, or height resolves to zero never yields a frame.
pub struct VideoSource {
    cap: VideoCapture,
    pub fps: f64,
    pub width: i32,
    pub height: i32,
    pub total_frames: i32,
    next_index: u64,
}

impl VideoSource {
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        info!("Opening video: {}", path.display());

        let cap = VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY).map_err(
            |e| PipelineError::OpenFailed {
                path: path.display().to_string(),
                reason: e.into(),
            },
        )?;

        let opened = cap.is_opened().map_err(|e| PipelineError::OpenFailed {
            path: path.display().to_string(),
            reason: e.into(),
        })?;
        if !opened {
            return Err(PipelineError::OpenFailed {
                path: path.display().to_string(),
                reason: anyhow::anyhow!("container rejected by every backend"),
            });
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS).unwrap_or(0.0);
        let total_frames =
            VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_COUNT).unwrap_or(0.0) as i32;
        let mut width =
            VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0) as i32;
        let mut height =
            VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0) as i32;

        // Encoders want even dimensions
        width -= width % 2;
        height -= height % 2;

        if fps == 0.0 || width == 0 || height == 0 {
            return Err(PipelineError::InvalidMetadata { fps, width, height });
        }

        info!(
            "Video properties: {}x{} @ {:.1} FPS, {} frames",
            width, height, fps, total_frames
        );

        Ok(Self {
            cap,
            fps,
            width,
            height,
            total_frames,
            next_index: 0,
        })
    }

    /// Next frame in strict file order, `None` at end of stream. The raster
    /// is converted BGR -> RGB and cropped to the even-adjusted dimensions.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();

        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            return Ok(None);
        }

        // Decoded frame may be one pixel wider/taller than the adjusted size
        let mat = if mat.cols() != self.width || mat.rows() != self.height {
            Mat::roi(
                &mat,
                opencv::core::Rect::new(0, 0, self.width, self.height),
            )?
            .try_clone()?
        } else {
            mat
        };

        let mut rgb_mat = Mat::default();
        imgproc::cvt_color(&mat, &mut rgb_mat, imgproc::COLOR_BGR2RGB, 0)?;

        let data = rgb_mat.data_bytes()?.to_vec();

        let index = self.next_index;
        self.next_index += 1;
        let timestamp_ms = (index as f64 / self.fps) * 1000.0;

        Ok(Some(Frame {
            data,
            width: self.width as usize,
            height: self.height as usize,
            index,
            timestamp_ms,
        }))
    }

    pub fn progress(&self) -> f32 {
        if self.total_frames <= 0 {
            return 0.0;
        }
        (self.next_index as f32 / self.total_frames as f32) * 100.0
    }
}
