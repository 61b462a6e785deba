//! End-to-end analysis of synthetic portraits.

use tint_face::{
    analyze_detections, AnalyzeOptions, Analyzer, AnalyzerConfig, BoundingBox, DetectionResult,
    EyeCategory, FaceDetection, HairCategory, PixelBuffer, Point, RecordedDetector,
    SkinToneCategory,
};

const BACKGROUND: [u8; 4] = [90, 160, 90, 255];
const SKIN: [u8; 4] = [200, 150, 110, 255];
const HAIR: [u8; 4] = [15, 12, 10, 255];
const IRIS: [u8; 4] = [90, 55, 30, 255];
const PUPIL: [u8; 4] = [5, 5, 5, 255];

const FACE: BoundingBox = BoundingBox {
    x: 100.0,
    y: 110.0,
    width: 100.0,
    height: 120.0,
};
const LEFT_IRIS: Point = Point::new(130.0, 150.0);
const RIGHT_IRIS: Point = Point::new(170.0, 150.0);
const IRIS_RADIUS: f32 = 8.0;

/// Skin-filled face box, black hair above and beside it, dark brown irises.
fn portrait(iris: [u8; 4]) -> PixelBuffer {
    PixelBuffer::from_fn(300, 300, |x, y| {
        let p = Point::new(x as f32, y as f32);
        let in_face = (100..200).contains(&x) && (110..230).contains(&y);
        let on_top = (85..215).contains(&x) && (60..110).contains(&y);
        let on_sides =
            ((85..100).contains(&x) || (200..215).contains(&x)) && (110..170).contains(&y);

        for center in [LEFT_IRIS, RIGHT_IRIS] {
            let d = p.distance(&center);
            if d <= 2.0 {
                return PUPIL;
            }
            if d <= IRIS_RADIUS {
                return iris;
            }
        }
        if in_face {
            SKIN
        } else if on_top || on_sides {
            HAIR
        } else {
            BACKGROUND
        }
    })
}

fn iris_ring(center: Point) -> Vec<Point> {
    let mut ring = vec![center];
    for i in 0..4 {
        let a = (i as f32 * 90.0).to_radians();
        ring.push(Point::new(
            center.x + IRIS_RADIUS * a.cos(),
            center.y + IRIS_RADIUS * a.sin(),
        ));
    }
    ring
}

fn detections() -> DetectionResult {
    let mut face = FaceDetection::from_box(FACE);
    face.landmarks.left_eye_iris = Some(iris_ring(LEFT_IRIS));
    face.landmarks.right_eye_iris = Some(iris_ring(RIGHT_IRIS));
    DetectionResult {
        faces: vec![face],
        ..Default::default()
    }
}

fn seeded() -> AnalyzerConfig {
    let mut config = AnalyzerConfig::default();
    config.cluster.seed = Some(17);
    config
}

#[test]
fn synthetic_portrait_classifies_every_region() {
    let report = analyze_detections(&detections(), &portrait(IRIS), &seeded(), &AnalyzeOptions::default()).unwrap();
    let face = report.people[0].face.as_ref().expect("face record");
    let colors = &face.colors;

    let eye = colors.eye_color.attribute().expect("eye color");
    assert!(
        matches!(eye.color, EyeCategory::Brown | EyeCategory::DarkBrown),
        "eye {:?}",
        eye.color
    );
    assert_eq!(colors.eye_color.confidence(), 100);

    let hair = colors.hair_color.attribute().expect("hair color");
    assert_eq!(hair.color, HairCategory::Black);
    assert_eq!(hair.skin_color, tint_face::Rgb::new(200, 150, 110));

    // (200, 150, 110) has lightness 60.8.
    let skin = colors.skin_tone.attribute().expect("skin tone");
    assert_eq!(skin.tone, SkinToneCategory::Medium);
    assert_eq!(colors.skin_tone.confidence(), 100);
}

#[test]
fn classification_is_stable_across_seeds() {
    let image = portrait(IRIS);
    for seed in 0..5 {
        let mut config = AnalyzerConfig::default();
        config.cluster.seed = Some(seed);
        let report = analyze_detections(&detections(), &image, &config, &AnalyzeOptions::default()).unwrap();
        let colors = &report.people[0].face.as_ref().unwrap().colors;
        assert_eq!(colors.hair_color.attribute().unwrap().color, HairCategory::Black);
        assert_eq!(colors.skin_tone.attribute().unwrap().tone, SkinToneCategory::Medium);
    }
}

#[test]
fn shadowed_iris_reports_unknown_eye() {
    let report = analyze_detections(
        &detections(),
        &portrait([20, 18, 16, 255]),
        &seeded(),
        &AnalyzeOptions::default(),
    )
    .unwrap();
    let colors = &report.people[0].face.as_ref().unwrap().colors;
    assert!(colors.eye_color.attribute().is_none());
    assert_eq!(colors.eye_color.confidence(), 0);
    assert!(colors.skin_tone.attribute().is_some());
}

#[test]
fn report_json_shape() {
    let report = analyze_detections(&detections(), &portrait(IRIS), &seeded(), &AnalyzeOptions::default()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert!(json["timestamp"].is_string());
    assert_eq!(json["imageInfo"]["width"], 300);
    assert_eq!(json["summary"]["totalFaces"], 1);
    assert_eq!(json["summary"]["totalBodies"], 0);
    assert!(json["allGestures"].as_array().unwrap().is_empty());

    let face = &json["people"][0]["face"];
    assert_eq!(json["people"][0]["personIndex"], 0);
    for key in ["eyeColor", "hairColor"] {
        let color = &face[key];
        assert!(color["color"].is_string(), "{key}");
        assert!(color["colorName"].is_string(), "{key}");
        assert!(color["simpleColorName"].is_string(), "{key}");
        assert!(color["hex"].as_str().unwrap().starts_with('#'), "{key}");
        assert!(color["rgb"]["r"].is_u64(), "{key}");
        assert!(color["hsl"]["h"].is_number(), "{key}");
        assert!(color["confidence"].is_u64(), "{key}");
        assert!(color["pixelCount"].as_u64().unwrap() > 0, "{key}");
        assert!(!color["clusters"].as_array().unwrap().is_empty(), "{key}");
    }
    assert_eq!(face["hairColor"]["color"], "black");
    assert!(face["hairColor"]["cropSize"]["width"].is_u64());
    assert!(face["hairColor"]["backgroundColors"].is_array());
    assert_eq!(face["skinTone"]["tone"], "medium");
    assert!(face["skinTone"]["undertone"].is_string());
    assert!(face["skinTone"]["fitzpatrick"].as_str().unwrap().starts_with("Type"));
}

#[test]
fn stored_detections_through_the_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("faces.json.bz2");
    detections().save(&path).unwrap();

    let analyzer = Analyzer::new(RecordedDetector::load(&path).unwrap(), seeded()).unwrap();
    let debug_dir = dir.path().join("crops");
    let options = AnalyzeOptions {
        debug_dir: Some(debug_dir.clone()),
    };
    let report = analyzer.analyze(&portrait(IRIS), &options).unwrap();
    analyzer.shutdown().unwrap();

    assert_eq!(report.people.len(), 1);
    for name in ["person_0.png", "person_0_eye.png", "person_0_skin.png", "person_0_hair.png"] {
        assert!(debug_dir.join(name).exists(), "{name}");
    }
    let eye_crop = PixelBuffer::open(debug_dir.join("person_0_eye.png")).unwrap();
    assert_eq!(tint_face::PixelAccess::width(&eye_crop), 32);
}

#[test]
fn detector_json_with_three_dimensional_points() {
    let json = r#"{
        "faces": [{
            "score": 0.97,
            "box": {"x": 100, "y": 110, "width": 100, "height": 120},
            "landmarks": {
                "leftEyeIris": [[130, 150, -3], [138, 150, -3], [130, 158, -3], [122, 150, -3], [130, 142, -3]],
                "rightEyeIris": [[170, 150, -3], [178, 150, -3], [170, 158, -3], [162, 150, -3], [170, 142, -3]],
                "leftEyebrowUpper": [[115, 138], [125, 136], [140, 137]],
                "rightEyebrowUpper": [[160, 137], [175, 136], [185, 138]]
            },
            "rotation": {"angle": {"pitch": 0.0, "yaw": 0.5, "roll": 0.0}, "gaze": {"bearing": 1.6, "strength": 0.4}},
            "attributes": {"age": 27.26, "gender": "female", "genderScore": 0.9, "distance": 0.8}
        }],
        "gestures": [{"face": 0, "gesture": "mouth 40% open"}, {"iris": 0, "gesture": "blink left eye"}]
    }"#;
    let result: DetectionResult = serde_json::from_str(json).unwrap();
    let report = analyze_detections(&result, &portrait(IRIS), &seeded(), &AnalyzeOptions::default()).unwrap();
    let face = report.people[0].face.as_ref().unwrap();

    assert_eq!(face.score, 97);
    assert_eq!(face.age, Some(27.3));
    assert_eq!(face.head_direction.direction, "facing left");
    assert_eq!(face.gaze_direction.direction.as_str(), "up");
    assert_eq!(face.mouth.open_percent, Some(40));
    assert_eq!(face.eyes.left, "closed");
    assert_eq!(face.distance.unwrap().description, "close");
    assert_eq!(report.people[0].face_gestures.as_ref().unwrap().len(), 2);
    assert_eq!(face.colors.hair_color.attribute().unwrap().color, HairCategory::Black);
}
