use rand::Rng;
use tracing::debug;

use crate::attribute::{classify_dominant, ColorClassification, CropSize, HairColor, UnknownReason};
use crate::classify::classify_hair_color;
use crate::cluster::mean_color;
use crate::color::Rgb;
use crate::config::HairSamplerConfig;
use crate::detection::{FaceDetection, Side};
use crate::geometry::{ellipse_polygon, point_in_polygon, scale_about_centroid};
use crate::pixels::{PixelAccess, PixelBuffer};
use crate::sampler::{Sampled, SamplingContext};
use crate::types::Point;

/// Hair search window around the face, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CropWindow {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl CropWindow {
    /// Above and around the face, clamped to the image on every side.
    fn around<I: PixelAccess>(face: &FaceDetection, image: &I, config: &HairSamplerConfig) -> Self {
        let b = &face.bbox;
        let (image_w, image_h) = (image.width() as f32, image.height() as f32);

        let left = (b.x - b.width * config.side_padding).max(0.0);
        let top = (b.y - b.height * config.top_padding).max(0.0);
        let right = (b.right() + b.width * config.side_padding).min(image_w);
        let bottom = (b.y + b.height * config.bottom_extent).min(image_h);

        let x = left.round() as i32;
        let y = top.round() as i32;
        let width = (right - x as f32).round().max(0.0) as u32;
        let height = (bottom - y as f32).round().max(0.0) as u32;
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn pixel<I: PixelAccess>(&self, image: &I, x: u32, y: u32) -> Option<Rgb> {
        image.rgb(self.x + x as i32, self.y + y as i32)
    }
}

/// Forehead strip in crop coordinates.
#[derive(Debug, Clone, Copy)]
struct Forehead {
    top: f32,
    bottom: f32,
    left: f32,
    right: f32,
}

impl Forehead {
    fn locate(face: &FaceDetection, offset: Point, config: &HairSamplerConfig) -> Self {
        let b = &face.bbox;
        let brow_line = [Side::Left, Side::Right]
            .into_iter()
            .filter_map(|side| face.landmarks.eyebrow(side))
            .flatten()
            .map(|p| p.y)
            .reduce(f32::min)
            .unwrap_or(b.y + b.height * config.forehead_fallback);

        Self {
            top: b.y - offset.y,
            bottom: brow_line - offset.y,
            left: b.x - offset.x + b.width * config.forehead_inset,
            right: b.x - offset.x + b.width * (1.0 - config.forehead_inset),
        }
    }

    /// The strip widened by `margin` pixels sideways and below.
    fn band_contains(&self, x: f32, y: f32, margin: f32) -> bool {
        y >= self.top && y <= self.bottom + margin && x >= self.left - margin && x <= self.right + margin
    }
}

/// Mean color of the forehead strip, inset vertically to stay clear of the
/// hairline and the brows.
fn estimate_skin<I: PixelAccess>(
    image: &I,
    crop: &CropWindow,
    forehead: &Forehead,
    config: &HairSamplerConfig,
) -> Rgb {
    let margin = config.forehead_vertical_margin;
    let y0 = (forehead.top + margin).max(0.0).ceil() as u32;
    let y1 = (forehead.bottom - margin).min(crop.height as f32);
    let x0 = forehead.left.max(0.0).ceil() as u32;
    let x1 = forehead.right.min(crop.width as f32);

    let mut samples = Vec::new();
    let mut y = y0;
    while (y as f32) < y1 {
        let mut x = x0;
        while (x as f32) < x1 {
            if let Some(rgb) = crop.pixel(image, x, y) {
                samples.push(rgb);
            }
            x += 1;
        }
        y += 1;
    }

    if samples.len() > config.min_skin_samples {
        mean_color(&samples).color
    } else {
        Rgb::from(config.default_skin)
    }
}

fn corner_size(crop: &CropWindow, config: &HairSamplerConfig) -> u32 {
    let scaled = (crop.width.min(crop.height) as f32 * config.corner_fraction).floor() as u32;
    scaled.max(config.min_corner_size).min(crop.width.min(crop.height))
}

/// Background palette from the four corner patches of the crop.
fn estimate_background<I, R>(
    image: &I,
    crop: &CropWindow,
    corner: u32,
    config: &HairSamplerConfig,
    ctx: &mut SamplingContext<'_, R>,
) -> Vec<Rgb>
where
    I: PixelAccess,
    R: Rng + ?Sized,
{
    let far_x = crop.width - corner;
    let far_y = crop.height - corner;
    let mut samples = Vec::new();
    for (cx, cy) in [(0, 0), (far_x, 0), (0, far_y), (far_x, far_y)] {
        for y in cy..cy + corner {
            for x in cx..cx + corner {
                if let Some(rgb) = crop.pixel(image, x, y) {
                    samples.push(rgb);
                }
            }
        }
    }

    if samples.len() <= config.min_background_samples {
        return vec![Rgb::from(config.default_background)];
    }
    match ctx.dominant(&samples, config.background_clusters) {
        Some(dominant) => dominant
            .clusters
            .into_iter()
            .filter(|c| c.size > 0)
            .map(|c| c.color)
            .collect(),
        None => vec![Rgb::from(config.default_background)],
    }
}

/// Face outline in crop coordinates.
fn face_polygon(face: &FaceDetection, offset: Point, config: &HairSamplerConfig) -> Vec<Point> {
    match face.landmarks.silhouette() {
        Some(silhouette) if silhouette.len() > config.min_silhouette_points => {
            scale_about_centroid(silhouette, config.silhouette_scale)
                .into_iter()
                .map(|p| p - offset)
                .collect()
        }
        _ => {
            let b = &face.bbox;
            ellipse_polygon(
                b.center() - offset,
                b.width / 2.0 * config.ellipse_scale,
                b.height / 2.0 * config.ellipse_scale,
                10,
            )
        }
    }
}

#[derive(Debug, Default)]
struct MaskStats {
    background: usize,
    eyes: usize,
    face: usize,
    skin: usize,
}

/// Dominant hair color above and around the face.
///
/// Inside the crop every pixel that looks like background, eye, face
/// interior, or skin is masked out; whatever remains is treated as hair.
pub fn sample_hair_color<I, R>(
    face: &FaceDetection,
    image: &I,
    config: &HairSamplerConfig,
    ctx: &mut SamplingContext<'_, R>,
) -> Sampled<HairColor>
where
    I: PixelAccess,
    R: Rng + ?Sized,
{
    let crop = CropWindow::around(face, image, config);
    if crop.width <= config.min_crop_size || crop.height <= config.min_crop_size {
        debug!(?crop, "hair crop too small");
        return Sampled::new(ColorClassification::unknown(UnknownReason::InvalidCropRegion, 0), None);
    }

    let offset = Point::new(crop.x as f32, crop.y as f32);
    let outline = face_polygon(face, offset, config);
    let forehead = Forehead::locate(face, offset, config);
    let skin = estimate_skin(image, &crop, &forehead, config);
    let corner = corner_size(&crop, config);
    let background = estimate_background(image, &crop, corner, config, ctx);

    let eye_radius = face.bbox.width * config.eye_exclusion_radius;
    let eye_centers: Vec<Point> = [Side::Left, Side::Right]
        .into_iter()
        .filter_map(|side| face.landmarks.iris(side))
        .map(|iris| iris[0] - offset)
        .collect();

    let mut debug_crop = ctx
        .capture_crops
        .then(|| PixelBuffer::transparent(crop.width, crop.height));
    let mut stats = MaskStats::default();
    let mut pixels = Vec::new();

    for y in 0..crop.height {
        for x in 0..crop.width {
            let Some(rgb) = crop.pixel(image, x, y) else {
                continue;
            };
            let (px, py) = (x as f32, y as f32);
            let here = Point::new(px, py);
            let hsl = rgb.to_hsl();

            let bg_distance = background
                .iter()
                .map(|bg| rgb.distance(bg))
                .fold(f32::INFINITY, f32::min);
            let edge_distance = x.min(y).min(crop.width - 1 - x).min(crop.height - 1 - y);

            let is_background = bg_distance < config.background_distance
                || hsl.l > config.max_lightness
                || (hsl.s < config.gray_saturation && hsl.l > config.gray_lightness)
                || (edge_distance < corner && bg_distance < config.edge_background_distance);
            if is_background {
                stats.background += 1;
                continue;
            }
            if eye_centers.iter().any(|c| here.distance(c) < eye_radius) {
                stats.eyes += 1;
                continue;
            }
            if point_in_polygon(px, py, &outline) {
                stats.face += 1;
                continue;
            }
            let skin_distance = rgb.distance(&skin);
            let forehead_skin = forehead.band_contains(px, py, config.forehead_band_margin)
                && skin_distance < config.forehead_skin_distance;
            if forehead_skin || skin_distance < config.skin_distance {
                stats.skin += 1;
                continue;
            }

            pixels.push(rgb);
            if let Some(out) = debug_crop.as_mut() {
                out.set(x as i32, y as i32, [rgb.r, rgb.g, rgb.b, 255]);
            }
        }
    }

    let count = pixels.len();
    debug!(
        ?crop,
        pixels = count,
        background = stats.background,
        eyes = stats.eyes,
        face = stats.face,
        skin = stats.skin,
        "sampled hair"
    );

    if count < config.min_pixels {
        return Sampled::new(
            ColorClassification::unknown(UnknownReason::InsufficientHairPixels, count),
            debug_crop,
        );
    }

    let crop_size = CropSize {
        width: crop.width,
        height: crop.height,
    };
    let classification = match ctx.dominant(&pixels, config.clusters) {
        Some(dominant) => classify_dominant(dominant, count, config.full_confidence_pixels, |hsl| HairColor {
            color: classify_hair_color(hsl.h, hsl.s, hsl.l),
            crop_size,
            background_colors: background,
            skin_color: skin,
        }),
        None => ColorClassification::unknown(UnknownReason::EmptySample, count),
    };
    Sampled::new(classification, debug_crop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::HairCategory;
    use crate::config::ClusterConfig;
    use crate::types::BoundingBox;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const BACKGROUND: [u8; 4] = [60, 140, 60, 255];
    const SKIN: [u8; 4] = [200, 160, 135, 255];

    /// Face box at (60, 80) 80x100 filled with skin on a green backdrop,
    /// with `hair` above it and down both sides.
    fn portrait(hair: [u8; 4]) -> (FaceDetection, PixelBuffer) {
        let bbox = BoundingBox::new(60.0, 80.0, 80.0, 100.0);
        let image = PixelBuffer::from_fn(200, 240, |x, y| {
            let in_face = (60..140).contains(&x) && (80..180).contains(&y);
            let on_top = (50..150).contains(&x) && (40..80).contains(&y);
            let on_sides = ((50..60).contains(&x) || (140..150).contains(&x)) && (80..120).contains(&y);
            if in_face {
                SKIN
            } else if on_top || on_sides {
                hair
            } else {
                BACKGROUND
            }
        });
        (FaceDetection::from_box(bbox), image)
    }

    fn run(face: &FaceDetection, image: &PixelBuffer) -> Sampled<HairColor> {
        let cluster = ClusterConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut ctx = SamplingContext::new(&cluster, &mut rng).with_crops(true);
        sample_hair_color(face, image, &HairSamplerConfig::default(), &mut ctx)
    }

    #[test]
    fn crop_is_clamped_to_image() {
        let (face, image) = portrait([20, 15, 10, 255]);
        let crop = CropWindow::around(&face, &image, &HairSamplerConfig::default());
        assert_eq!(crop, CropWindow { x: 36, y: 20, width: 128, height: 110 });

        let edge = FaceDetection::from_box(BoundingBox::new(150.0, 10.0, 80.0, 100.0));
        let crop = CropWindow::around(&edge, &image, &HairSamplerConfig::default());
        assert_eq!(crop.y, 0);
        assert_eq!(crop.x + crop.width as i32, 200);
    }

    #[test]
    fn black_hair() {
        let (face, image) = portrait([20, 15, 10, 255]);
        let sampled = run(&face, &image);
        let measured = sampled.classification.measured().expect("hair measured");
        assert_eq!(measured.attribute.color, HairCategory::Black);
        assert_eq!(measured.attribute.skin_color, Rgb::new(200, 160, 135));
        assert!(measured
            .attribute
            .background_colors
            .iter()
            .any(|c| c.distance(&Rgb::new(60, 140, 60)) < 5.0));
        assert!(sampled.crop.is_some());
    }

    #[test]
    fn bald_head_is_unknown() {
        let (face, image) = portrait(SKIN);
        let sampled = run(&face, &image);
        assert_eq!(
            sampled.classification.reason(),
            Some(UnknownReason::InsufficientHairPixels)
        );
        assert_eq!(sampled.classification.confidence(), 0);
    }

    #[test]
    fn tiny_crop_is_rejected() {
        let image = PixelBuffer::from_fn(12, 12, |_, _| BACKGROUND);
        let face = FaceDetection::from_box(BoundingBox::new(2.0, 2.0, 8.0, 8.0));
        let sampled = run(&face, &image);
        assert_eq!(sampled.classification.reason(), Some(UnknownReason::InvalidCropRegion));
    }

    /// Twelve vertices on the rectangle x 38..162, y 95..185, centroid (100, 140).
    fn wide_silhouette() -> Vec<Point> {
        let (l, r, t, b) = (38.0, 162.0, 95.0, 185.0);
        let (x1, x2) = (79.0, 121.0);
        vec![
            Point::new(l, t),
            Point::new(x1, t),
            Point::new(x2, t),
            Point::new(r, t),
            Point::new(r, 125.0),
            Point::new(r, 155.0),
            Point::new(r, b),
            Point::new(x2, b),
            Point::new(x1, b),
            Point::new(l, b),
            Point::new(l, 155.0),
            Point::new(l, 125.0),
        ]
    }

    #[test]
    fn silhouette_masks_cheeks_outside_the_box() {
        const PURPLE: [u8; 4] = [120, 40, 140, 255];
        let (mut face, mut image) = portrait([20, 15, 10, 255]);
        // Wider than the box and clear of the corner patches.
        for y in 108..117 {
            for x in 50..150 {
                image.set(x, y, PURPLE);
            }
        }
        let has_purple = |sampled: &Sampled<HairColor>| {
            sampled
                .crop
                .as_ref()
                .unwrap()
                .as_raw()
                .chunks(4)
                .any(|px| px == PURPLE)
        };

        // The box ellipse leaves the cheeks at x 50..68 in the sample.
        assert!(has_purple(&run(&face, &image)));

        face.landmarks.silhouette = Some(wide_silhouette());
        let sampled = run(&face, &image);
        assert!(!has_purple(&sampled));
        assert_eq!(sampled.classification.attribute().unwrap().color, HairCategory::Black);
    }

    #[test]
    fn eyebrows_set_the_forehead_line() {
        let (mut face, mut image) = portrait([20, 15, 10, 255]);
        // Lower face below the brows in a darker shade.
        for y in 100..180 {
            for x in 60..140 {
                image.set(x, y, [150, 100, 80, 255]);
            }
        }
        let config = HairSamplerConfig::default();
        let offset = Point::new(36.0, 20.0);

        let fallback = Forehead::locate(&face, offset, &config);
        assert!((fallback.bottom - 90.0).abs() < 1e-4);
        // The strip reaches into the darker rows.
        assert_ne!(
            run(&face, &image).classification.attribute().unwrap().skin_color,
            Rgb::new(200, 160, 135)
        );

        face.landmarks.left_eyebrow_upper =
            Some(vec![Point::new(70.0, 101.0), Point::new(80.0, 100.0), Point::new(90.0, 101.0)]);
        face.landmarks.right_eyebrow_upper =
            Some(vec![Point::new(110.0, 101.0), Point::new(120.0, 100.5), Point::new(130.0, 101.0)]);
        let forehead = Forehead::locate(&face, offset, &config);
        assert!((forehead.top - 60.0).abs() < 1e-4);
        assert!((forehead.bottom - 80.0).abs() < 1e-4);

        let sampled = run(&face, &image);
        assert_eq!(
            sampled.classification.attribute().unwrap().skin_color,
            Rgb::new(200, 160, 135)
        );
    }
}
