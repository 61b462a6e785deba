//! SeetaFace frontal face detection through `rustface`.
//!
//! Produces boxes only. Every landmark group is absent, so the samplers use
//! their box-derived fallbacks (ellipse face outline, default forehead line)
//! and the eye color is reported as unknown.

use std::path::Path;

use tracing::debug;

use crate::analyzer::Detector;
use crate::detection::{DetectionResult, FaceDetection};
use crate::error::{Error, Result};
use crate::pixels::{PixelAccess, PixelBuffer};
use crate::types::BoundingBox;

pub struct RustfaceDetector {
    inner: Box<dyn rustface::Detector>,
}

impl RustfaceDetector {
    /// Load a SeetaFace model (e.g. `seeta_fd_frontal_v1.0.bin`).
    pub fn load<P: AsRef<Path>>(model: P, min_face_size: u32) -> Result<Self> {
        let path = model.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Detector(format!("invalid model path {}", path.display())))?;
        let mut inner = rustface::create_detector(path_str)
            .map_err(|e| Error::Detector(format!("failed to load face detector: {e}")))?;
        inner.set_min_face_size(min_face_size);
        inner.set_score_thresh(2.0);
        inner.set_pyramid_scale_factor(0.8);
        inner.set_slide_window_step(4, 4);
        Ok(Self { inner })
    }
}

impl Detector for RustfaceDetector {
    fn detect(&mut self, image: &PixelBuffer) -> Result<DetectionResult> {
        let luma = image.to_luma();
        let data = rustface::ImageData::new(&luma, image.width(), image.height());
        let faces: Vec<FaceDetection> = self
            .inner
            .detect(&data)
            .iter()
            .enumerate()
            .map(|(i, info)| {
                let bbox = info.bbox();
                let mut face = FaceDetection::from_box(BoundingBox::new(
                    bbox.x() as f32,
                    bbox.y() as f32,
                    bbox.width() as f32,
                    bbox.height() as f32,
                ));
                face.id = Some(i as u32);
                face.score = info.score() as f32;
                face
            })
            .collect();
        debug!(faces = faces.len(), "seeta detection");

        Ok(DetectionResult {
            faces,
            ..Default::default()
        })
    }
}
