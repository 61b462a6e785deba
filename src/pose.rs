//! Pose, gaze, gesture and body descriptors attached to each person record.
//!
//! These read detector outputs only; no pixels are involved.

use serde::Serialize;

use crate::classify::labels;
use crate::detection::{BodyDetection, EmotionScore, Gesture, Rotation};

/// Angles beyond this many degrees count as turned.
const TURN_DEGREES: f32 = 15.0;
const GAZE_MIN_STRENGTH: f32 = 0.1;
/// Hip-to-knee vertical distance below which a body is sitting, in pixels.
const SITTING_HIP_KNEE: f32 = 50.0;
/// Shoulder-over-hip horizontal offset that counts as leaning, in pixels.
const LEAN_OFFSET: f32 = 20.0;

/// Round a unit score to a whole percentage.
pub fn percent(score: f32) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

labels! {
    Vertical {
        Straight => "straight",
        Up => "up",
        Down => "down",
    }
}

labels! {
    Horizontal {
        Center => "center",
        Left => "left",
        Right => "right",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadAngles {
    pub pitch_degrees: i32,
    pub yaw_degrees: i32,
    pub roll_degrees: i32,
    pub vertical: Vertical,
    pub horizontal: Horizontal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadDirection {
    /// "facing center", "facing left", "facing up", "facing right-down", ...
    /// or "unknown" without rotation angles.
    pub direction: String,
    #[serde(flatten)]
    pub angles: Option<HeadAngles>,
}

pub fn head_direction(rotation: Option<&Rotation>) -> HeadDirection {
    let Some(angle) = rotation.and_then(|r| r.angle) else {
        return HeadDirection {
            direction: "unknown".to_string(),
            angles: None,
        };
    };

    let pitch = angle.pitch.to_degrees();
    let yaw = angle.yaw.to_degrees();
    let roll = angle.roll.to_degrees();

    let vertical = if pitch > TURN_DEGREES {
        Vertical::Down
    } else if pitch < -TURN_DEGREES {
        Vertical::Up
    } else {
        Vertical::Straight
    };
    let horizontal = if yaw > TURN_DEGREES {
        Horizontal::Left
    } else if yaw < -TURN_DEGREES {
        Horizontal::Right
    } else {
        Horizontal::Center
    };

    let direction = match (vertical, horizontal) {
        (Vertical::Straight, Horizontal::Center) => "facing center".to_string(),
        (Vertical::Straight, h) => format!("facing {h}"),
        (v, Horizontal::Center) => format!("facing {v}"),
        (v, h) => format!("facing {h}-{v}"),
    };

    HeadDirection {
        direction,
        angles: Some(HeadAngles {
            pitch_degrees: pitch.round() as i32,
            yaw_degrees: yaw.round() as i32,
            roll_degrees: roll.round() as i32,
            vertical,
            horizontal,
        }),
    }
}

labels! {
    GazeSector {
        Unknown => "unknown",
        Center => "center",
        Up => "up",
        Left => "left",
        Down => "down",
        Right => "right",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GazeDirection {
    pub direction: GazeSector,
    pub bearing_degrees: Option<i32>,
    pub strength_percent: u8,
}

/// Quantize the gaze bearing into 45°-bounded sectors. Weak gazes look at
/// the camera.
pub fn gaze_direction(rotation: Option<&Rotation>) -> GazeDirection {
    let Some(gaze) = rotation.and_then(|r| r.gaze) else {
        return GazeDirection {
            direction: GazeSector::Unknown,
            bearing_degrees: None,
            strength_percent: 0,
        };
    };

    let bearing = gaze.bearing.to_degrees();
    let direction = if gaze.strength > GAZE_MIN_STRENGTH {
        if bearing > 45.0 && bearing <= 135.0 {
            GazeSector::Up
        } else if bearing > 135.0 && bearing <= 225.0 {
            GazeSector::Left
        } else if bearing > 225.0 && bearing <= 315.0 {
            GazeSector::Down
        } else {
            GazeSector::Right
        }
    } else {
        GazeSector::Center
    };

    GazeDirection {
        direction,
        bearing_degrees: Some(bearing.round() as i32),
        strength_percent: percent(gaze.strength),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EyesState {
    pub left: String,
    pub right: String,
    pub both_open: bool,
    pub blinking: bool,
}

impl EyesState {
    pub fn from_gestures<'a, I>(gestures: I) -> Self
    where
        I: IntoIterator<Item = &'a Gesture>,
    {
        let mut left = "open".to_string();
        let mut right = "open".to_string();
        for g in gestures {
            let text = g.gesture.as_str();
            if let Some(state) = eye_gesture(text, "left") {
                left = state;
            }
            if let Some(state) = eye_gesture(text, "right") {
                right = state;
            }
        }
        Self {
            both_open: left == "open" && right == "open",
            blinking: left == "closed" || right == "closed",
            left,
            right,
        }
    }
}

/// "blink left eye" closes the eye; "left eye <state>" sets any other state.
fn eye_gesture(gesture: &str, side: &str) -> Option<String> {
    if gesture.contains(&format!("blink {side} eye")) {
        return Some("closed".to_string());
    }
    let prefix = format!("{side} eye");
    if !gesture.contains(&prefix) {
        return None;
    }
    Some(gesture.replacen(&format!("{prefix} "), "", 1))
}

labels! {
    MouthOpening {
        Closed => "closed",
        SlightlyOpen => "slightly open",
        Open => "open",
        WideOpen => "wide open",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MouthState {
    pub state: MouthOpening,
    pub open_percent: Option<u32>,
}

impl MouthState {
    pub fn from_gestures<'a, I>(gestures: I) -> Self
    where
        I: IntoIterator<Item = &'a Gesture>,
    {
        let mut mouth = Self {
            state: MouthOpening::Closed,
            open_percent: None,
        };
        for g in gestures {
            if let Some(percent) = mouth_open_percent(&g.gesture) {
                mouth.open_percent = Some(percent);
                mouth.state = match percent {
                    0..=9 => MouthOpening::Closed,
                    10..=29 => MouthOpening::SlightlyOpen,
                    30..=59 => MouthOpening::Open,
                    _ => MouthOpening::WideOpen,
                };
            }
        }
        mouth
    }
}

/// Parse "mouth 35% open".
fn mouth_open_percent(gesture: &str) -> Option<u32> {
    let start = gesture.find("mouth ")? + "mouth ".len();
    let rest = &gesture[start..];
    let end = rest.find("% open")?;
    let digits = &rest[..end];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distance {
    pub meters: f32,
    pub description: &'static str,
}

pub fn describe_distance(meters: f32) -> Distance {
    let description = if meters < 0.5 {
        "very close"
    } else if meters < 1.0 {
        "close"
    } else if meters < 2.0 {
        "medium"
    } else {
        "far"
    };
    Distance {
        meters: (meters * 100.0).round() / 100.0,
        description,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionReport {
    pub emotion: String,
    pub score: u8,
}

impl From<&EmotionScore> for EmotionReport {
    fn from(e: &EmotionScore) -> Self {
        Self {
            emotion: e.emotion.clone(),
            score: percent(e.score),
        }
    }
}

labels! {
    Posture {
        Unknown => "unknown",
        Sitting => "sitting",
        Standing => "standing",
    }
}

labels! {
    Lean {
        None => "none",
        Upright => "upright",
        LeaningLeft => "leaning left",
        LeaningRight => "leaning right",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyPosture {
    pub posture: Posture,
    pub lean: Lean,
    pub gestures_detected: Vec<String>,
}

fn midpoint_of(body: &BodyDetection, a: &str, b: &str) -> Option<(f32, f32)> {
    let a = body.keypoint(a)?.position;
    let b = body.keypoint(b)?.position;
    Some(((a.x + b.x) / 2.0, (a.y + b.y) / 2.0))
}

/// Posture and lean from hip, knee and shoulder keypoints.
pub fn body_posture<'a, I>(body: &BodyDetection, gestures: I) -> BodyPosture
where
    I: IntoIterator<Item = &'a Gesture>,
{
    let hips = midpoint_of(body, "leftHip", "rightHip");
    let knees = midpoint_of(body, "leftKnee", "rightKnee");
    let shoulders = midpoint_of(body, "leftShoulder", "rightShoulder");

    let posture = match (hips, knees) {
        (Some((_, hip_y)), Some((_, knee_y))) if (knee_y - hip_y).abs() < SITTING_HIP_KNEE => {
            Posture::Sitting
        }
        (Some(_), Some(_)) => Posture::Standing,
        _ => Posture::Unknown,
    };

    let lean = match (shoulders, hips) {
        (Some((shoulder_x, _)), Some((hip_x, _))) => {
            let offset = shoulder_x - hip_x;
            if offset > LEAN_OFFSET {
                Lean::LeaningRight
            } else if offset < -LEAN_OFFSET {
                Lean::LeaningLeft
            } else {
                Lean::Upright
            }
        }
        _ => Lean::None,
    };

    BodyPosture {
        posture,
        lean,
        gestures_detected: gestures.into_iter().map(|g| g.gesture.clone()).collect(),
    }
}
