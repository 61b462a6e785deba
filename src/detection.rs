//! Typed detector output consumed by the analysis.
//!
//! Every landmark group is optional: a detector that produces only boxes
//! leaves all groups `None`, and the samplers take their structural
//! fallbacks (ellipse face outline, default forehead line, and so on).

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{BoundingBox, Point};

/// Which side of the face a paired feature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Named landmark groups. Iris rings store their centre first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Landmarks {
    pub silhouette: Option<Vec<Point>>,
    pub left_eye_iris: Option<Vec<Point>>,
    pub right_eye_iris: Option<Vec<Point>>,
    pub left_eye_upper0: Option<Vec<Point>>,
    pub left_eye_lower0: Option<Vec<Point>>,
    pub right_eye_upper0: Option<Vec<Point>>,
    pub right_eye_lower0: Option<Vec<Point>>,
    pub left_eyebrow_upper: Option<Vec<Point>>,
    pub right_eyebrow_upper: Option<Vec<Point>>,
}

impl Landmarks {
    pub fn silhouette(&self) -> Option<&[Point]> {
        non_empty(&self.silhouette)
    }

    pub fn iris(&self, side: Side) -> Option<&[Point]> {
        match side {
            Side::Left => non_empty(&self.left_eye_iris),
            Side::Right => non_empty(&self.right_eye_iris),
        }
    }

    /// Upper and lower eyelid lines, only when both are present.
    pub fn eyelids(&self, side: Side) -> Option<(&[Point], &[Point])> {
        let (upper, lower) = match side {
            Side::Left => (&self.left_eye_upper0, &self.left_eye_lower0),
            Side::Right => (&self.right_eye_upper0, &self.right_eye_lower0),
        };
        Some((non_empty(upper)?, non_empty(lower)?))
    }

    pub fn eyebrow(&self, side: Side) -> Option<&[Point]> {
        match side {
            Side::Left => non_empty(&self.left_eyebrow_upper),
            Side::Right => non_empty(&self.right_eyebrow_upper),
        }
    }

    fn groups_mut(&mut self) -> [&mut Option<Vec<Point>>; 9] {
        [
            &mut self.silhouette,
            &mut self.left_eye_iris,
            &mut self.right_eye_iris,
            &mut self.left_eye_upper0,
            &mut self.left_eye_lower0,
            &mut self.right_eye_upper0,
            &mut self.right_eye_lower0,
            &mut self.left_eyebrow_upper,
            &mut self.right_eyebrow_upper,
        ]
    }

    fn points(&self) -> impl Iterator<Item = &Point> {
        [
            &self.silhouette,
            &self.left_eye_iris,
            &self.right_eye_iris,
            &self.left_eye_upper0,
            &self.left_eye_lower0,
            &self.right_eye_upper0,
            &self.right_eye_lower0,
            &self.left_eyebrow_upper,
            &self.right_eyebrow_upper,
        ]
        .into_iter()
        .flatten()
        .flatten()
    }
}

fn non_empty(group: &Option<Vec<Point>>) -> Option<&[Point]> {
    group.as_deref().filter(|points| !points.is_empty())
}

/// Head rotation in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Angles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Gaze bearing in radians and strength in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gaze {
    pub bearing: f32,
    pub strength: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    pub angle: Option<Angles>,
    pub gaze: Option<Gaze>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub emotion: String,
    pub score: f32,
}

/// Per-face model scores beyond the landmark geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FaceAttributes {
    pub age: Option<f32>,
    pub gender: Option<String>,
    pub gender_score: Option<f32>,
    /// Sorted by descending score.
    pub emotion: Vec<EmotionScore>,
    pub real: Option<f32>,
    pub live: Option<f32>,
    /// Estimated camera distance in metres.
    pub distance: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetection {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub score: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    #[serde(default)]
    pub landmarks: Landmarks,
    #[serde(default)]
    pub rotation: Option<Rotation>,
    #[serde(default)]
    pub attributes: FaceAttributes,
}

impl FaceDetection {
    /// A detection carrying only a box.
    pub fn from_box(bbox: BoundingBox) -> Self {
        Self {
            id: None,
            score: 1.0,
            bbox,
            landmarks: Landmarks::default(),
            rotation: None,
            attributes: FaceAttributes::default(),
        }
    }

    /// Check the input contract: a finite box with positive area and
    /// finite landmark coordinates.
    pub fn validate(&self, index: usize) -> Result<()> {
        if !self.bbox.is_valid() {
            return Err(Error::InvalidFace {
                index,
                reason: format!("unusable bounding box {:?}", self.bbox),
            });
        }
        if self.landmarks.points().any(|p| !p.is_finite()) {
            return Err(Error::InvalidFace {
                index,
                reason: "non-finite landmark coordinate".to_string(),
            });
        }
        Ok(())
    }

    /// Shift the box and every landmark by (dx, dy).
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        let mut face = self.clone();
        face.bbox = self.bbox.translated(dx, dy);
        let offset = Point::new(dx, dy);
        for group in face.landmarks.groups_mut().into_iter().flatten() {
            for p in group.iter_mut() {
                *p += offset;
            }
        }
        face
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub part: String,
    pub position: Point,
    #[serde(default)]
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDetection {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub score: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
}

impl BodyDetection {
    pub fn keypoint(&self, part: &str) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.part == part)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub score: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    #[serde(default)]
    pub label: Option<String>,
}

/// A recognised gesture and the detection it refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gesture {
    pub face: Option<usize>,
    pub iris: Option<usize>,
    pub body: Option<usize>,
    pub hand: Option<usize>,
    pub gesture: String,
}

/// Everything a detector reports for one image, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionResult {
    pub faces: Vec<FaceDetection>,
    pub bodies: Vec<BodyDetection>,
    pub hands: Vec<HandDetection>,
    pub gestures: Vec<Gesture>,
}

enum Format {
    Json,
    CompressedJson,
    Binary,
}

fn format_of(path: &Path) -> Format {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if name.ends_with(".bz2") {
        Format::CompressedJson
    } else if name.ends_with(".bin") {
        Format::Binary
    } else {
        Format::Json
    }
}

impl DetectionResult {
    /// Load stored detections. The format follows the file name:
    /// `.bin` is bincode, `.bz2` is bzip2-compressed JSON, anything else JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let result = match format_of(path) {
            Format::Json => serde_json::from_reader(reader)?,
            Format::CompressedJson => {
                let mut text = String::new();
                BzDecoder::new(reader).read_to_string(&mut text)?;
                serde_json::from_str(&text)?
            }
            Format::Binary => {
                let mut bytes = Vec::new();
                let mut reader = reader;
                reader.read_to_end(&mut bytes)?;
                bincode::deserialize(&bytes)?
            }
        };
        Ok(result)
    }

    /// Save detections in the format implied by the file name.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        match format_of(path) {
            Format::Json => serde_json::to_writer_pretty(&mut writer, self)?,
            Format::CompressedJson => {
                let mut encoder = BzEncoder::new(&mut writer, Compression::default());
                serde_json::to_writer(&mut encoder, self)?;
                encoder.finish()?;
            }
            Format::Binary => writer.write_all(&bincode::serialize(self)?)?,
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_face() -> FaceDetection {
        let mut face = FaceDetection::from_box(BoundingBox::new(10.0, 20.0, 100.0, 120.0));
        face.landmarks.left_eye_iris = Some(vec![Point::new(40.0, 60.0), Point::new(45.0, 60.0)]);
        face.landmarks.silhouette = Some(vec![]);
        face
    }

    #[test]
    fn empty_groups_count_as_absent() {
        let face = sample_face();
        assert!(face.landmarks.silhouette().is_none());
        assert!(face.landmarks.iris(Side::Left).is_some());
        assert!(face.landmarks.iris(Side::Right).is_none());
        assert!(face.landmarks.eyelids(Side::Left).is_none());
    }

    #[test]
    fn translation_moves_box_and_landmarks() {
        let moved = sample_face().translated(-10.0, -20.0);
        assert_eq!(moved.bbox, BoundingBox::new(0.0, 0.0, 100.0, 120.0));
        assert_eq!(moved.landmarks.iris(Side::Left).unwrap()[0], Point::new(30.0, 40.0));
    }

    #[test]
    fn validation() {
        assert!(sample_face().validate(0).is_ok());

        let mut bad = sample_face();
        bad.bbox.width = -1.0;
        assert!(matches!(bad.validate(3), Err(Error::InvalidFace { index: 3, .. })));

        let mut bad = sample_face();
        bad.landmarks.right_eye_iris = Some(vec![Point::new(f32::NAN, 1.0)]);
        assert!(bad.validate(0).is_err());
    }

    #[test]
    fn parses_detector_json() {
        let json = r#"{
            "faces": [{
                "score": 0.93,
                "box": {"x": 5, "y": 6, "width": 50, "height": 60},
                "landmarks": {
                    "leftEyeIris": [[20, 30, -4], [22, 30, -4]],
                    "leftEyeUpper0": [[15, 28], [25, 28]]
                },
                "rotation": {"angle": {"pitch": 0.1, "yaw": -0.4, "roll": 0.0}},
                "attributes": {"age": 31.4, "emotion": [{"emotion": "happy", "score": 0.8}]}
            }],
            "gestures": [{"face": 0, "gesture": "blink left eye"}]
        }"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.faces.len(), 1);
        let face = &result.faces[0];
        assert_eq!(face.landmarks.iris(Side::Left).unwrap()[1], Point::new(22.0, 30.0));
        assert!(face.landmarks.eyebrow(Side::Left).is_none());
        assert_eq!(face.attributes.age, Some(31.4));
        assert_eq!(result.gestures[0].face, Some(0));
        assert!(result.bodies.is_empty());
    }

    #[test]
    fn save_and_load_every_format() {
        let result = DetectionResult {
            faces: vec![sample_face()],
            gestures: vec![Gesture {
                face: Some(0),
                gesture: "mouth 40% open".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let dir = tempfile::tempdir().unwrap();
        for name in ["detections.json", "detections.json.bz2", "detections.bin"] {
            let path = dir.path().join(name);
            result.save(&path).unwrap();
            let loaded = DetectionResult::load(&path).unwrap();
            assert_eq!(loaded, result, "{name}");
        }
    }
}
