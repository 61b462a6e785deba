//! Exported analysis records.
//!
//! Everything here serializes to camelCase JSON. People are listed by face
//! detection order; bodies without a matching face and faces that failed
//! validation still get a record, carrying a `note` instead of the missing
//! part.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::attribute::{ColorClassification, EyeColor, HairColor};
use crate::classify::SkinTone;
use crate::detection::{BodyDetection, DetectionResult, FaceDetection, Gesture, HandDetection};
use crate::pose::{
    body_posture, describe_distance, gaze_direction, head_direction, percent, BodyPosture,
    Distance, EmotionReport, EyesState, GazeDirection, HeadDirection, MouthState,
};
use crate::types::{BoundingBox, Point};

/// The three color attributes of one face.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceColors {
    pub eye_color: ColorClassification<EyeColor>,
    pub hair_color: ColorClassification<HairColor>,
    pub skin_tone: ColorClassification<SkinTone>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceReport {
    pub id: Option<u32>,
    pub score: u8,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub age: Option<f32>,
    pub gender: Option<String>,
    pub gender_score: Option<u8>,
    pub emotion: Vec<EmotionReport>,
    pub primary_emotion: Option<EmotionReport>,
    pub head_direction: HeadDirection,
    pub gaze_direction: GazeDirection,
    pub eyes: EyesState,
    pub mouth: MouthState,
    pub distance: Option<Distance>,
    pub real: Option<u8>,
    pub live: Option<u8>,
    #[serde(flatten)]
    pub colors: FaceColors,
}

impl FaceReport {
    /// `gestures` are the ones referring to this face.
    pub fn new(face: &FaceDetection, gestures: &[&Gesture], colors: FaceColors) -> Self {
        let attrs = &face.attributes;
        let emotion: Vec<EmotionReport> = attrs.emotion.iter().map(EmotionReport::from).collect();
        let rotation = face.rotation.as_ref();

        Self {
            id: face.id,
            score: percent(face.score),
            bbox: face.bbox,
            age: attrs.age.map(|a| (a * 10.0).round() / 10.0),
            gender: attrs.gender.clone(),
            gender_score: attrs.gender_score.map(percent),
            primary_emotion: emotion.first().cloned(),
            emotion,
            head_direction: head_direction(rotation),
            gaze_direction: gaze_direction(rotation),
            eyes: EyesState::from_gestures(gestures.iter().copied()),
            mouth: MouthState::from_gestures(gestures.iter().copied()),
            distance: attrs.distance.map(describe_distance),
            real: attrs.real.map(percent),
            live: attrs.live.map(percent),
            colors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeypointReport {
    pub part: String,
    pub position: Point,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyReport {
    pub id: Option<u32>,
    pub score: u8,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub posture: BodyPosture,
    pub keypoints: Vec<KeypointReport>,
}

impl BodyReport {
    pub fn new(body: &BodyDetection, gestures: &[&Gesture]) -> Self {
        Self {
            id: body.id,
            score: percent(body.score),
            bbox: body.bbox,
            posture: body_posture(body, gestures.iter().copied()),
            keypoints: body
                .keypoints
                .iter()
                .map(|kp| KeypointReport {
                    part: kp.part.clone(),
                    position: kp.position,
                    score: percent(kp.score),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandReport {
    pub id: Option<u32>,
    pub score: u8,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub label: Option<String>,
    pub gestures: Vec<String>,
}

impl HandReport {
    pub fn new(hand: &HandDetection, gestures: &[&Gesture]) -> Self {
        Self {
            id: hand.id,
            score: percent(hand.score),
            bbox: hand.bbox,
            label: hand.label.clone(),
            gestures: gestures.iter().map(|g| g.gesture.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub person_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_gestures: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hands: Vec<HandReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PersonRecord {
    pub fn with_face(person_index: usize, face: FaceReport, gestures: &[&Gesture]) -> Self {
        Self {
            person_index,
            face: Some(face),
            face_gestures: Some(gestures.iter().map(|g| g.gesture.clone()).collect()),
            body: None,
            hands: Vec::new(),
            note: None,
        }
    }

    /// Placeholder keeping the index of a face that could not be analyzed.
    pub fn skipped(person_index: usize, note: String) -> Self {
        Self {
            person_index,
            face: None,
            face_gestures: None,
            body: None,
            hands: Vec::new(),
            note: Some(note),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_faces: usize,
    pub total_bodies: usize,
    pub total_hands: usize,
    pub total_gestures: usize,
}

impl Summary {
    pub fn of(result: &DetectionResult) -> Self {
        Self {
            total_faces: result.faces.len(),
            total_bodies: result.bodies.len(),
            total_hands: result.hands.len(),
            total_gestures: result.gestures.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub timestamp: DateTime<Utc>,
    pub image_info: ImageInfo,
    pub summary: Summary,
    pub people: Vec<PersonRecord>,
    pub all_gestures: Vec<Gesture>,
}

impl AnalysisReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Gestures that refer to face `index`, directly or through its iris.
pub fn face_gestures(gestures: &[Gesture], index: usize) -> Vec<&Gesture> {
    gestures
        .iter()
        .filter(|g| g.face == Some(index) || g.iris == Some(index))
        .collect()
}

/// Index of the face whose centre is closest to the body's head position,
/// if it lies within half the body height. Faces that fail validation are
/// never candidates.
///
/// The head position is the nose keypoint's height when present, otherwise
/// the top of the body box, at the box's horizontal centre.
pub fn match_body_to_face(body: &BodyDetection, faces: &[FaceDetection]) -> Option<usize> {
    let head_y = body
        .keypoint("nose")
        .map_or(body.bbox.y, |nose| nose.position.y);
    let head = Point::new(body.bbox.x + body.bbox.width / 2.0, head_y);
    let limit = body.bbox.height * 0.5;

    let mut best: Option<(usize, f32)> = None;
    for (index, face) in faces.iter().enumerate() {
        if face.validate(index).is_err() {
            continue;
        }
        let distance = face.bbox.center().distance(&head);
        if distance < limit && best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Attach bodies and hands to the face records in `people`.
///
/// `people` holds one record per detected face, in face order. Unmatched
/// bodies are appended as standalone records; hand `i` goes to person
/// `i / 2` and is dropped when that person does not exist.
pub fn attach_bodies_and_hands(people: &mut Vec<PersonRecord>, result: &DetectionResult) {
    for (index, body) in result.bodies.iter().enumerate() {
        let gestures: Vec<&Gesture> = result
            .gestures
            .iter()
            .filter(|g| g.body == Some(index))
            .collect();
        let report = BodyReport::new(body, &gestures);

        match match_body_to_face(body, &result.faces).filter(|i| *i < people.len()) {
            Some(face) => people[face].body = Some(report),
            None => {
                debug!(body = index, "body without matching face");
                people.push(PersonRecord {
                    person_index: people.len(),
                    face: None,
                    face_gestures: None,
                    body: Some(report),
                    hands: Vec::new(),
                    note: Some("Body detected without matching face".to_string()),
                });
            }
        }
    }

    for (index, hand) in result.hands.iter().enumerate() {
        let gestures: Vec<&Gesture> = result
            .gestures
            .iter()
            .filter(|g| g.hand == Some(index))
            .collect();
        match people.get_mut(index / 2) {
            Some(person) => person.hands.push(HandReport::new(hand, &gestures)),
            None => debug!(hand = index, "hand without a person to attach to"),
        }
    }
}
