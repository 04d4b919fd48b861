// src/annotator.rs
//
// Connection overlays for every present landmark channel. Drawing is
// cosmetic only: the behavior heuristic reads normalized coordinates and
// never inspects pixels, so nothing here feeds back into analysis.

use crate::landmarks::schema::{FACE_OVAL_CONNECTIONS, HAND_CONNECTIONS, POSE_CONNECTIONS};
use crate::landmarks::{Landmark, LandmarkSet};
use crate::types::Frame;
use anyhow::Result;
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};

/// Produce a BGR frame with skeleton/mesh overlays. Inputs are untouched.
pub fn annotate(frame: &Frame, landmarks: &LandmarkSet) -> Result<Mat> {
    let mat = Mat::from_slice(&frame.data)?;
    let mat = mat.reshape(3, frame.height as i32)?;

    let mut output = Mat::default();
    imgproc::cvt_color(&mat, &mut output, imgproc::COLOR_RGB2BGR, 0)?;

    let width = frame.width as f32;
    let height = frame.height as f32;

    if let Some(points) = &landmarks.face {
        draw_connections(
            &mut output,
            points,
            &FACE_OVAL_CONNECTIONS,
            core::Scalar::new(200.0, 200.0, 200.0, 0.0), // Gray
            width,
            height,
            false,
        )?;
    }
    if let Some(points) = &landmarks.pose {
        draw_connections(
            &mut output,
            points,
            &POSE_CONNECTIONS,
            core::Scalar::new(0.0, 255.0, 0.0, 0.0), // Green
            width,
            height,
            true,
        )?;
    }
    if let Some(points) = &landmarks.left_hand {
        draw_connections(
            &mut output,
            points,
            &HAND_CONNECTIONS,
            core::Scalar::new(255.0, 0.0, 0.0, 0.0), // Blue
            width,
            height,
            true,
        )?;
    }
    if let Some(points) = &landmarks.right_hand {
        draw_connections(
            &mut output,
            points,
            &HAND_CONNECTIONS,
            core::Scalar::new(0.0, 0.0, 255.0, 0.0), // Red
            width,
            height,
            true,
        )?;
    }

    Ok(output)
}

fn draw_connections(
    output: &mut Mat,
    points: &[Landmark],
    connections: &[(usize, usize)],
    color: core::Scalar,
    width: f32,
    height: f32,
    draw_points: bool,
) -> Result<()> {
    let to_pixel = |p: &Landmark| {
        core::Point::new((p.x * width).round() as i32, (p.y * height).round() as i32)
    };

    for &(a, b) in connections {
        let (Some(pa), Some(pb)) = (points.get(a), points.get(b)) else {
            continue;
        };
        imgproc::line(
            output,
            to_pixel(pa),
            to_pixel(pb),
            color,
            1,
            imgproc::LINE_AA,
            0,
        )?;
    }

    if draw_points {
        for point in points {
            imgproc::circle(
                output,
                to_pixel(point),
                2,
                color,
                -1,
                imgproc::LINE_8,
                0,
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::schema::POSE_LANDMARK_COUNT;

    fn blank_frame(width: usize, height: usize) -> Frame {
        Frame {
            data: vec![0u8; width * height * 3],
            width,
            height,
            index: 0,
            timestamp_ms: 0.0,
        }
    }

    #[test]
    fn test_annotate_preserves_dimensions() {
        let frame = blank_frame(32, 16);
        let annotated = annotate(&frame, &LandmarkSet::empty()).unwrap();
        assert_eq!(annotated.cols(), 32);
        assert_eq!(annotated.rows(), 16);
    }

    #[test]
    fn test_annotate_does_not_mutate_input() {
        let frame = blank_frame(32, 16);
        let pose = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        let set = LandmarkSet {
            pose: Some(pose),
            ..Default::default()
        };

        let annotated = annotate(&frame, &set).unwrap();
        // Overlay landed on the output
        assert!(annotated.data_bytes().unwrap().iter().any(|&b| b != 0));
        // Source raster untouched
        assert!(frame.data.iter().all(|&b| b == 0));
    }
}
