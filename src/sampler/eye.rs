use rand::Rng;
use tracing::debug;

use crate::attribute::{classify_dominant, ColorClassification, EyeColor, UnknownReason};
use crate::classify::classify_eye_color;
use crate::color::Rgb;
use crate::config::EyeSamplerConfig;
use crate::detection::{FaceDetection, Side};
use crate::geometry::estimate_ring_radius;
use crate::pixels::{PixelAccess, PixelBuffer};
use crate::sampler::{Sampled, SamplingContext};
use crate::types::Point;

struct IrisSample {
    side: Side,
    center: Point,
    radius: f32,
    pixels: Vec<Rgb>,
}

enum IrisOutcome {
    Sampled(IrisSample),
    /// Ring radius not finite or larger than the face allows.
    Implausible,
}

/// Sample an annulus of the iris, skipping the pupil and the limbal ring.
fn sample_iris<I: PixelAccess>(
    ring: &[Point],
    side: Side,
    max_radius: f32,
    image: &I,
    config: &EyeSamplerConfig,
) -> Option<IrisOutcome> {
    if ring.len() < 2 {
        return None;
    }
    let center = ring[0];
    let radius = estimate_ring_radius(ring)?;
    if !radius.is_finite() || radius > max_radius {
        return Some(IrisOutcome::Implausible);
    }
    let inner = radius * config.inner_radius;
    let outer = radius * config.outer_radius;
    let radii = if config.radial_step > 0.0 && outer >= inner {
        ((outer - inner) / config.radial_step).floor() as usize + 1
    } else {
        0
    };

    let mut pixels = Vec::new();
    for angle in (0..360).step_by(config.angle_step_degrees.max(1)) {
        let (sin, cos) = (angle as f32).to_radians().sin_cos();
        for i in 0..radii {
            let r = inner + i as f32 * config.radial_step;
            let x = (center.x + r * cos).round() as i32;
            let y = (center.y + r * sin).round() as i32;
            if let Some(rgb) = image.rgb(x, y) {
                if rgb.brightness() > config.min_brightness {
                    pixels.push(rgb);
                }
            }
        }
    }

    Some(IrisOutcome::Sampled(IrisSample {
        side,
        center,
        radius,
        pixels,
    }))
}

/// Dominant iris color of one face.
///
/// The left iris is sampled first. When it yields fewer than
/// `fallback_pixels`, the right iris is tried and kept if it yields more.
pub fn sample_eye_color<I, R>(
    face: &FaceDetection,
    image: &I,
    config: &EyeSamplerConfig,
    ctx: &mut SamplingContext<'_, R>,
) -> Sampled<EyeColor>
where
    I: PixelAccess,
    R: Rng + ?Sized,
{
    let b = &face.bbox;
    let diagonal = (image.width() as f32).hypot(image.height() as f32);
    let max_radius = b.width.max(b.height).min(diagonal);

    let mut implausible = false;
    let mut sample_side = |side: Side| {
        match face
            .landmarks
            .iris(side)
            .and_then(|ring| sample_iris(ring, side, max_radius, image, config))?
        {
            IrisOutcome::Sampled(sample) => Some(sample),
            IrisOutcome::Implausible => {
                debug!(?side, "iris ring radius out of range");
                implausible = true;
                None
            }
        }
    };

    let mut best = sample_side(Side::Left);
    if best.as_ref().map_or(true, |s| s.pixels.len() < config.fallback_pixels) {
        let preferred = best.as_ref().map_or(Side::Left, |s| s.side);
        if let Some(other) = sample_side(preferred.other()) {
            if best.as_ref().map_or(true, |s| other.pixels.len() > s.pixels.len()) {
                best = Some(other);
            }
        }
    }

    let Some(sample) = best else {
        let reason = if implausible {
            UnknownReason::InvalidIrisGeometry
        } else {
            UnknownReason::MissingIris
        };
        return Sampled::new(ColorClassification::unknown(reason, 0), None);
    };

    let count = sample.pixels.len();
    debug!(side = ?sample.side, radius = sample.radius, pixels = count, "sampled iris");

    let crop = ctx.capture_crops.then(|| iris_crop(image, sample.center, sample.radius));

    if count < config.min_pixels {
        return Sampled::new(
            ColorClassification::unknown(UnknownReason::InsufficientIrisPixels, count),
            crop,
        );
    }

    let classification = match ctx.dominant(&sample.pixels, config.clusters) {
        Some(dominant) => classify_dominant(dominant, count, config.full_confidence_pixels, |hsl| EyeColor {
            color: classify_eye_color(hsl.h, hsl.s, hsl.l),
        }),
        None => ColorClassification::unknown(UnknownReason::EmptySample, count),
    };
    Sampled::new(classification, crop)
}

/// Square of side `4 * radius` centred on the iris, clipped to the image.
fn iris_crop<I: PixelAccess>(image: &I, center: Point, radius: f32) -> PixelBuffer {
    let half = radius * 2.0;
    let (w, h) = (image.width() as f32, image.height() as f32);
    let x0 = (center.x - half).round().clamp(0.0, w);
    let y0 = (center.y - half).round().clamp(0.0, h);
    let x1 = (center.x + half).round().clamp(0.0, w);
    let y1 = (center.y + half).round().clamp(0.0, h);
    let (x0, y0) = (x0 as i32, y0 as i32);
    PixelBuffer::from_fn((x1 as i32 - x0) as u32, (y1 as i32 - y0) as u32, |x, y| {
        image
            .rgba(x0 + x as i32, y0 + y as i32)
            .unwrap_or([0, 0, 0, 0])
    })
}
