use rand::Rng;
use tracing::debug;

use crate::attribute::{classify_dominant, ColorClassification, UnknownReason};
use crate::classify::{classify_skin_tone, SkinTone};
use crate::color::Rgb;
use crate::config::SkinSamplerConfig;
use crate::detection::{FaceDetection, Side};
use crate::geometry::{
    closed_contour, ellipse_polygon, point_in_polygon, polygon_bounds, scale_about_centroid,
};
use crate::pixels::{PixelAccess, PixelBuffer};
use crate::sampler::{Sampled, SamplingContext};
use crate::types::Point;

/// Face outline: the shrunken silhouette when it is detailed enough,
/// otherwise an ellipse inscribed in the box.
fn face_polygon(face: &FaceDetection, config: &SkinSamplerConfig) -> Vec<Point> {
    match face.landmarks.silhouette() {
        Some(silhouette) if silhouette.len() > config.min_silhouette_points => {
            scale_about_centroid(silhouette, config.silhouette_scale)
        }
        _ => {
            let bbox = &face.bbox;
            ellipse_polygon(
                bbox.center(),
                bbox.width / 2.0 * config.ellipse_scale_x,
                bbox.height / 2.0 * config.ellipse_scale_y,
                10,
            )
        }
    }
}

/// Region to exclude for one eye. Eyelid contours win over an iris circle.
fn eye_polygon(face: &FaceDetection, side: Side, config: &SkinSamplerConfig) -> Vec<Point> {
    if let Some((upper, lower)) = face.landmarks.eyelids(side) {
        return closed_contour(upper, lower);
    }
    match face.landmarks.iris(side) {
        Some(iris) => {
            let radius = match iris.get(1) {
                Some(edge) => edge.distance(&iris[0]) * config.eye_radius_scale,
                None => face.bbox.width * config.eye_radius_fallback,
            };
            ellipse_polygon(iris[0], radius, radius, 20)
        }
        None => Vec::new(),
    }
}

/// Dominant skin color over the face outline, eyes excluded.
pub fn sample_skin_tone<I, R>(
    face: &FaceDetection,
    image: &I,
    config: &SkinSamplerConfig,
    ctx: &mut SamplingContext<'_, R>,
) -> Sampled<SkinTone>
where
    I: PixelAccess,
    R: Rng + ?Sized,
{
    let outline = face_polygon(face, config);
    let eyes = [
        eye_polygon(face, Side::Left, config),
        eye_polygon(face, Side::Right, config),
    ];

    let Some(bounds) = polygon_bounds(&outline, image.width(), image.height()) else {
        return Sampled::new(ColorClassification::unknown(UnknownReason::InsufficientPixels, 0), None);
    };

    let mut crop = ctx
        .capture_crops
        .then(|| PixelBuffer::transparent(bounds.width(), bounds.height()));
    let mut pixels = Vec::new();

    for y in bounds.min_y..=bounds.max_y {
        for x in bounds.min_x..=bounds.max_x {
            let (px, py) = (x as f32, y as f32);
            if !point_in_polygon(px, py, &outline) {
                continue;
            }
            let Some(rgba) = image.rgba(x, y) else {
                continue;
            };
            if let Some(crop) = crop.as_mut() {
                crop.set(x - bounds.min_x, y - bounds.min_y, rgba);
            }
            if eyes.iter().any(|eye| point_in_polygon(px, py, eye)) {
                continue;
            }
            let [r, g, b, _] = rgba;
            let brightness = (r as f32 + g as f32 + b as f32) / 3.0;
            if brightness > config.min_brightness && brightness < config.max_brightness {
                pixels.push(Rgb::new(r, g, b));
            }
        }
    }

    let count = pixels.len();
    debug!(pixels = count, outline = outline.len(), "sampled skin");

    if count < config.min_pixels {
        return Sampled::new(
            ColorClassification::unknown(UnknownReason::InsufficientPixels, count),
            crop,
        );
    }

    let classification = match ctx.dominant(&pixels, config.clusters) {
        Some(dominant) => classify_dominant(dominant, count, config.full_confidence_pixels, |hsl| {
            classify_skin_tone(hsl.h, hsl.s, hsl.l)
        }),
        None => ColorClassification::unknown(UnknownReason::EmptySample, count),
    };
    Sampled::new(classification, crop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{SkinToneCategory, Undertone};
    use crate::config::ClusterConfig;
    use crate::types::BoundingBox;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SKIN: [u8; 4] = [198, 150, 120, 255];

    fn run(face: &FaceDetection, image: &PixelBuffer) -> Sampled<SkinTone> {
        let cluster = ClusterConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut ctx = SamplingContext::new(&cluster, &mut rng).with_crops(true);
        sample_skin_tone(face, image, &SkinSamplerConfig::default(), &mut ctx)
    }

    #[test]
    fn ellipse_fallback_measures_skin() {
        let image = PixelBuffer::from_fn(120, 120, |_, _| SKIN);
        let face = FaceDetection::from_box(BoundingBox::new(20.0, 20.0, 80.0, 80.0));

        let sampled = run(&face, &image);
        let tone = sampled.classification.attribute().unwrap();
        // (198, 150, 120): l = 62.4, h = 23
        assert_eq!(tone.tone, SkinToneCategory::Medium);
        assert_eq!(tone.undertone, Undertone::NeutralWarm);
        assert_eq!(sampled.classification.confidence(), 100);

        let crop = sampled.crop.unwrap();
        // Corners of the bounding rectangle lie outside the ellipse.
        assert_eq!(crop.rgba(0, 0), Some([0, 0, 0, 0]));
        let mid = (crop.width() / 2) as i32;
        assert_eq!(crop.rgba(mid, mid), Some(SKIN));
    }

    #[test]
    fn eyes_are_excluded() {
        let left = Point::new(45.0, 50.0);
        let right = Point::new(75.0, 50.0);
        let image = PixelBuffer::from_fn(120, 120, |x, y| {
            let p = Point::new(x as f32, y as f32);
            if p.distance(&left) < 7.0 || p.distance(&right) < 7.0 {
                [40, 90, 170, 255]
            } else {
                SKIN
            }
        });
        let mut face = FaceDetection::from_box(BoundingBox::new(20.0, 20.0, 80.0, 80.0));
        face.landmarks.left_eye_iris = Some(vec![left, Point::new(49.0, 50.0)]);
        face.landmarks.right_eye_iris = Some(vec![right, Point::new(79.0, 50.0)]);

        let sampled = run(&face, &image);
        let measured = sampled.classification.measured().unwrap();
        assert_eq!(measured.rgb, Rgb::new(198, 150, 120));
        assert_eq!(measured.clusters.iter().map(|c| c.size).sum::<usize>(), measured.pixel_count);
    }

    #[test]
    fn overexposed_face_is_unknown() {
        let image = PixelBuffer::from_fn(120, 120, |_, _| [250, 250, 250, 255]);
        let face = FaceDetection::from_box(BoundingBox::new(20.0, 20.0, 80.0, 80.0));
        let sampled = run(&face, &image);
        assert_eq!(sampled.classification.reason(), Some(UnknownReason::InsufficientPixels));
        assert_eq!(sampled.classification.pixel_count(), 0);
    }

    #[test]
    fn face_outside_image_is_unknown() {
        let image = PixelBuffer::from_fn(50, 50, |_, _| SKIN);
        let face = FaceDetection::from_box(BoundingBox::new(200.0, 200.0, 40.0, 40.0));
        let sampled = run(&face, &image);
        assert_eq!(sampled.classification.confidence(), 0);
        assert!(sampled.crop.is_none());
    }

    #[test]
    fn silhouette_outline_is_shrunk() {
        let center = Point::new(60.0, 60.0);
        let image = PixelBuffer::from_fn(120, 120, |x, y| {
            if Point::new(x as f32, y as f32).distance(&center) < 30.0 {
                SKIN
            } else {
                [40, 90, 170, 255]
            }
        });
        let mut face = FaceDetection::from_box(BoundingBox::new(20.0, 20.0, 80.0, 80.0));
        face.landmarks.silhouette = Some(ellipse_polygon(center, 30.0, 30.0, 20));

        let sampled = run(&face, &image);
        let measured = sampled.classification.measured().unwrap();
        assert_eq!(measured.rgb, Rgb::new(198, 150, 120));
        assert!(measured
            .clusters
            .iter()
            .filter(|c| c.size > 0)
            .all(|c| c.color == Rgb::new(198, 150, 120)));
        // Radius 28.5 after scaling, against 36 for the box ellipse.
        let crop = sampled.crop.unwrap();
        assert_eq!((crop.width(), crop.height()), (59, 59));
    }

    #[test]
    fn eyelid_contours_are_excluded() {
        let lids = |cx: f32| {
            (
                vec![Point::new(cx - 12.0, 50.0), Point::new(cx, 43.0), Point::new(cx + 12.0, 50.0)],
                vec![Point::new(cx - 12.0, 50.0), Point::new(cx, 57.0), Point::new(cx + 12.0, 50.0)],
            )
        };
        let (left_upper, left_lower) = lids(45.0);
        let (right_upper, right_lower) = lids(75.0);
        let eyes = [
            closed_contour(&left_upper, &left_lower),
            closed_contour(&right_upper, &right_lower),
        ];
        let image = PixelBuffer::from_fn(120, 120, |x, y| {
            if eyes.iter().any(|eye| point_in_polygon(x as f32, y as f32, eye)) {
                [40, 90, 170, 255]
            } else {
                SKIN
            }
        });

        let mut face = FaceDetection::from_box(BoundingBox::new(20.0, 20.0, 80.0, 80.0));
        face.landmarks.left_eye_upper0 = Some(left_upper);
        face.landmarks.left_eye_lower0 = Some(left_lower);
        face.landmarks.right_eye_upper0 = Some(right_upper);
        face.landmarks.right_eye_lower0 = Some(right_lower);
        // Iris circles of radius 2 would leave most of each eye in the sample.
        face.landmarks.left_eye_iris = Some(vec![Point::new(45.0, 50.0), Point::new(46.0, 50.0)]);
        face.landmarks.right_eye_iris = Some(vec![Point::new(75.0, 50.0), Point::new(76.0, 50.0)]);

        let sampled = run(&face, &image);
        let measured = sampled.classification.measured().unwrap();
        assert_eq!(measured.rgb, Rgb::new(198, 150, 120));
        assert!(measured
            .clusters
            .iter()
            .filter(|c| c.size > 0)
            .all(|c| c.color == Rgb::new(198, 150, 120)));
    }
}
