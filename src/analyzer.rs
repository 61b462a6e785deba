//! Detection backends, the analysis entry points and the model handle.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{AnalyzerConfig, PersonCropConfig};
use crate::detection::{DetectionResult, FaceDetection};
use crate::error::{Error, Result};
use crate::pixels::{PixelAccess, PixelBuffer};
use crate::report::{
    attach_bodies_and_hands, face_gestures, AnalysisReport, FaceColors, FaceReport, ImageInfo,
    PersonRecord, Summary,
};
use crate::sampler::{sample_eye_color, sample_hair_color, sample_skin_tone, SamplingContext};
use crate::types::BoundingBox;

/// Source of face, body, hand and gesture detections for an image.
pub trait Detector {
    fn detect(&mut self, image: &PixelBuffer) -> Result<DetectionResult>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self, image: &PixelBuffer) -> Result<DetectionResult> {
        (**self).detect(image)
    }
}

/// Replays detections stored earlier, whatever the image.
#[derive(Debug, Clone, Default)]
pub struct RecordedDetector {
    result: DetectionResult,
}

impl RecordedDetector {
    pub fn new(result: DetectionResult) -> Self {
        Self { result }
    }

    /// Load a `.json`, `.json.bz2` or `.bin` detection file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(DetectionResult::load(path)?))
    }
}

impl Detector for RecordedDetector {
    fn detect(&mut self, _image: &PixelBuffer) -> Result<DetectionResult> {
        Ok(self.result.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Write per-person crops here for inspection.
    pub debug_dir: Option<PathBuf>,
}

/// Region of the image kept around one face before sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PersonWindow {
    /// Pad the face box by the configured fractions, clamped to the image.
    pub fn around(bbox: &BoundingBox, width: u32, height: u32, config: &PersonCropConfig) -> Self {
        let side = bbox.width * config.side_padding;
        let top = bbox.height * config.top_padding;
        let bottom = bbox.height * config.bottom_padding;

        Self::clamped(bbox.x - side, bbox.y - top, bbox.width + side * 2.0, bbox.height + top + bottom, width, height)
    }

    /// The face box padded evenly by `padding` times its longer side.
    pub fn face(bbox: &BoundingBox, width: u32, height: u32, padding: f32) -> Self {
        let pad = bbox.width.max(bbox.height) * padding;
        Self::clamped(bbox.x - pad, bbox.y - pad, bbox.width + pad * 2.0, bbox.height + pad * 2.0, width, height)
    }

    fn clamped(x: f32, y: f32, w: f32, h: f32, width: u32, height: u32) -> Self {
        let x = (x.round().max(0.0) as u32).min(width);
        let y = (y.round().max(0.0) as u32).min(height);
        Self {
            x,
            y,
            width: (w.round().max(0.0) as u32).min(width - x),
            height: (h.round().max(0.0) as u32).min(height - y),
        }
    }
}

fn save_debug(dir: &Path, name: &str, buffer: &PixelBuffer) {
    if buffer.width() == 0 || buffer.height() == 0 {
        return;
    }
    let path = dir.join(name);
    match buffer.save_png(&path) {
        Ok(()) => debug!(path = %path.display(), "saved debug crop"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to save debug crop"),
    }
}

/// Crop the person region, move the face into it and run the three samplers.
fn analyze_face<R: Rng + ?Sized>(
    index: usize,
    face: &FaceDetection,
    image: &PixelBuffer,
    config: &AnalyzerConfig,
    debug_dir: Option<&Path>,
    rng: &mut R,
) -> FaceColors {
    let window = PersonWindow::around(&face.bbox, image.width(), image.height(), &config.person_crop);
    let crop = image.crop(window.x, window.y, window.width, window.height);
    let local = face.translated(-(window.x as f32), -(window.y as f32));

    let mut ctx = SamplingContext::new(&config.cluster, rng).with_crops(debug_dir.is_some());
    let eye = sample_eye_color(&local, &crop, &config.eye, &mut ctx);
    let hair = sample_hair_color(&local, &crop, &config.hair, &mut ctx);
    let skin = sample_skin_tone(&local, &crop, &config.skin, &mut ctx);

    if let Some(dir) = debug_dir {
        let tight = PersonWindow::face(&face.bbox, image.width(), image.height(), config.person_crop.face_padding);
        let face_crop = image.crop(tight.x, tight.y, tight.width, tight.height);
        save_debug(dir, &format!("person_{index}.png"), &face_crop);
        let crops = [("eye", &eye.crop), ("skin", &skin.crop), ("hair", &hair.crop)];
        for (region, region_crop) in crops {
            if let Some(buffer) = region_crop {
                save_debug(dir, &format!("person_{index}_{region}.png"), buffer);
            }
        }
    }

    debug!(
        face = index,
        ?window,
        eye = eye.classification.confidence(),
        hair = hair.classification.confidence(),
        skin = skin.classification.confidence(),
        "analyzed face"
    );

    FaceColors {
        eye_color: eye.classification,
        hair_color: hair.classification,
        skin_tone: skin.classification,
    }
}

/// Build the report for one image from detections already made.
///
/// The config is validated first. A face that fails validation is logged
/// and kept as a placeholder record; the remaining faces are analyzed as
/// usual.
pub fn analyze_detections(
    result: &DetectionResult,
    image: &PixelBuffer,
    config: &AnalyzerConfig,
    options: &AnalyzeOptions,
) -> Result<AnalysisReport> {
    config.validate()?;

    let debug_dir = options.debug_dir.as_deref().filter(|dir| {
        std::fs::create_dir_all(dir)
            .map_err(|e| warn!(dir = %dir.display(), error = %e, "debug output disabled"))
            .is_ok()
    });

    let mut rng = config.cluster.rng();
    let mut people = Vec::with_capacity(result.faces.len());

    for (index, face) in result.faces.iter().enumerate() {
        let gestures = face_gestures(&result.gestures, index);
        match face.validate(index) {
            Ok(()) => {
                let colors = analyze_face(index, face, image, config, debug_dir, &mut rng);
                let report = FaceReport::new(face, &gestures, colors);
                people.push(PersonRecord::with_face(index, report, &gestures));
            }
            Err(e) => {
                warn!(face = index, error = %e, "skipping face");
                people.push(PersonRecord::skipped(index, e.to_string()));
            }
        }
    }

    attach_bodies_and_hands(&mut people, result);

    Ok(AnalysisReport {
        timestamp: Utc::now(),
        image_info: ImageInfo {
            width: image.width(),
            height: image.height(),
        },
        summary: Summary::of(result),
        people,
        all_gestures: result.gestures.clone(),
    })
}

/// Long-lived analysis handle owning the detection model.
///
/// The model is loaded once by the caller and reused by every call. Calls
/// from several threads are serialized on the model; sampling itself shares
/// no state.
pub struct Analyzer<D> {
    detector: Mutex<D>,
    config: AnalyzerConfig,
}

impl<D: Detector> Analyzer<D> {
    pub fn new(detector: D, config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector: Mutex::new(detector),
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn detect(&self, image: &PixelBuffer) -> Result<DetectionResult> {
        let mut detector = self.detector.lock().map_err(|_| Error::DetectorPoisoned)?;
        detector.detect(image)
    }

    /// Detect, then analyze every face.
    pub fn analyze(&self, image: &PixelBuffer, options: &AnalyzeOptions) -> Result<AnalysisReport> {
        let start = Instant::now();
        let detections = self.detect(image)?;
        let detected = start.elapsed();

        let report = analyze_detections(&detections, image, &self.config, options)?;
        info!(
            faces = report.summary.total_faces,
            bodies = report.summary.total_bodies,
            detect_ms = detected.as_millis() as u64,
            total_ms = start.elapsed().as_millis() as u64,
            "analysis complete"
        );
        Ok(report)
    }

    /// Release the handle and hand the model back to the caller.
    pub fn shutdown(self) -> Result<D> {
        self.detector.into_inner().map_err(|_| Error::DetectorPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BodyDetection, Gesture};
    use crate::types::Point;

    fn checker(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                [180, 140, 120, 255]
            } else {
                [30, 30, 30, 255]
            }
        })
    }

    fn detections() -> DetectionResult {
        let mut bad = FaceDetection::from_box(BoundingBox::new(0.0, 0.0, 30.0, 30.0));
        bad.landmarks.silhouette = Some(vec![Point::new(f32::NAN, 0.0)]);
        DetectionResult {
            faces: vec![
                FaceDetection::from_box(BoundingBox::new(40.0, 60.0, 60.0, 70.0)),
                bad,
            ],
            bodies: vec![BodyDetection {
                id: Some(1),
                score: 0.5,
                bbox: BoundingBox::new(500.0, 0.0, 50.0, 50.0),
                keypoints: Vec::new(),
            }],
            gestures: vec![Gesture {
                face: Some(0),
                gesture: "blink right eye".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn person_window_is_clamped() {
        let config = PersonCropConfig::default();
        let window = PersonWindow::around(&BoundingBox::new(40.0, 60.0, 60.0, 70.0), 200, 200, &config);
        assert_eq!(window, PersonWindow { x: 16, y: 4, width: 108, height: 137 });

        let tight = PersonWindow::face(&BoundingBox::new(40.0, 60.0, 60.0, 70.0), 200, 200, 0.2);
        assert_eq!(tight, PersonWindow { x: 26, y: 46, width: 88, height: 98 });
        let tight = PersonWindow::face(&BoundingBox::new(5.0, 150.0, 60.0, 70.0), 200, 200, 0.2);
        assert_eq!((tight.x, tight.y + tight.height), (0, 200));

        let window = PersonWindow::around(&BoundingBox::new(180.0, 10.0, 60.0, 70.0), 200, 200, &config);
        assert_eq!(window.y, 0);
        assert_eq!(window.x + window.width, 200);

        let window = PersonWindow::around(&BoundingBox::new(400.0, 400.0, 60.0, 70.0), 200, 200, &config);
        assert_eq!((window.width, window.height), (0, 0));
    }

    #[test]
    fn bad_face_does_not_stop_the_others() {
        let image = checker(200, 200);
        let report = analyze_detections(&detections(), &image, &AnalyzerConfig::default(), &AnalyzeOptions::default()).unwrap();

        assert_eq!(report.summary.total_faces, 2);
        assert_eq!(report.people.len(), 3);
        let first = report.people[0].face.as_ref().unwrap();
        assert_eq!(first.eyes.right, "closed");
        assert!(report.people[1].face.is_none());
        assert!(report.people[1].note.as_deref().unwrap().contains("non-finite"));
        assert_eq!(report.people[2].note.as_deref(), Some("Body detected without matching face"));
        assert_eq!(report.image_info, ImageInfo { width: 200, height: 200 });
    }

    #[test]
    fn debug_crops_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let debug_dir = dir.path().join("debug");
        let options = AnalyzeOptions {
            debug_dir: Some(debug_dir.clone()),
        };
        analyze_detections(&detections(), &checker(200, 200), &AnalyzerConfig::default(), &options).unwrap();

        let face_crop = PixelBuffer::open(debug_dir.join("person_0.png")).unwrap();
        // Box 60x70 padded by 14 on every side.
        assert_eq!((face_crop.width(), face_crop.height()), (88, 98));
        assert!(debug_dir.join("person_0_skin.png").exists());
        assert!(debug_dir.join("person_0_hair.png").exists());
        // No iris landmarks, so nothing to crop.
        assert!(!debug_dir.join("person_0_eye.png").exists());
        assert!(!debug_dir.join("person_1.png").exists());
    }

    #[test]
    fn handle_reuses_and_returns_the_model() {
        let analyzer = Analyzer::new(RecordedDetector::new(detections()), AnalyzerConfig::default()).unwrap();
        let image = checker(200, 200);

        std::thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    let report = analyzer.analyze(&image, &AnalyzeOptions::default()).unwrap();
                    assert_eq!(report.people.len(), 3);
                });
            }
        });

        let detector = analyzer.shutdown().unwrap();
        assert_eq!(detector.result.faces.len(), 2);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = AnalyzerConfig::default();
        config.skin.clusters = 0;
        assert!(matches!(
            Analyzer::new(RecordedDetector::default(), config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn entry_point_validates_config() {
        let mut config = AnalyzerConfig::default();
        config.eye.radial_step = 0.0;
        let result = analyze_detections(&detections(), &checker(200, 200), &config, &AnalyzeOptions::default());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        config.eye.radial_step = f32::NAN;
        let result = analyze_detections(&detections(), &checker(200, 200), &config, &AnalyzeOptions::default());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
