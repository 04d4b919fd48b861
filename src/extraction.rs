// src/extraction.rs
//
// Frame-extraction side channel, independent of the behavior pipeline:
// dump every decodable frame of a container as a numbered JPEG and report
// how many were written. An unopenable container yields 0, not an error.

use anyhow::Result;
use opencv::{
    core::{Mat, Vector},
    imgcodecs,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub fn extract_frames(video_path: &Path, output_dir: &Path) -> Result<usize> {
    let mut cap = match VideoCapture::from_file(&video_path.to_string_lossy(), videoio::CAP_ANY) {
        Ok(cap) => cap,
        Err(_) => {
            warn!(
                "🚫 Failed to open video file for frame extraction: {}",
                video_path.display()
            );
            return Ok(0);
        }
    };
    if !cap.is_opened().unwrap_or(false) {
        warn!(
            "🚫 Failed to open video file for frame extraction: {}",
            video_path.display()
        );
        return Ok(0);
    }

    fs::create_dir_all(output_dir)?;

    let mut count = 0usize;
    loop {
        let mut mat = Mat::default();
        if !VideoCaptureTrait::read(&mut cap, &mut mat)? || mat.empty() {
            break;
        }

        let frame_path = output_dir.join(frame_filename(count));
        let params = Vector::<i32>::new();
        imgcodecs::imwrite(&frame_path.to_string_lossy(), &mat, &params)?;
        count += 1;
    }

    info!(
        "Extracted {} frames from {} into {}",
        count,
        video_path.display(),
        output_dir.display()
    );
    Ok(count)
}

/// Fixed-width zero-padded sequential name, `frame_0000.jpg` onward
fn frame_filename(index: usize) -> String {
    format!("frame_{index:04}.jpg")
}
