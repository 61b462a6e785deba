//! Tunable constants of the region samplers.
//!
//! Defaults reproduce the reference behaviour. A config file only needs to
//! name the fields it overrides:
//!
//! ```json
//! { "hair": { "skin_distance": 30.0 }, "cluster": { "seed": 42 } }
//! ```

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub max_iterations: usize,
    /// Stop once no centroid moves further than this (RGB units).
    pub tolerance: f32,
    /// Fixed seed for reproducible centroids; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-3,
            seed: None,
        }
    }
}

impl ClusterConfig {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeSamplerConfig {
    pub clusters: usize,
    /// Annulus bounds as fractions of the iris radius.
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub angle_step_degrees: usize,
    pub radial_step: f32,
    /// Samples at or below this brightness are pupil or shadow.
    pub min_brightness: f32,
    /// Below this many pixels from the left iris, try the right one.
    pub fallback_pixels: usize,
    pub min_pixels: usize,
    /// Pixel count that earns full confidence.
    pub full_confidence_pixels: usize,
}

impl Default for EyeSamplerConfig {
    fn default() -> Self {
        Self {
            clusters: 4,
            inner_radius: 0.5,
            outer_radius: 0.95,
            angle_step_degrees: 5,
            radial_step: 2.0,
            min_brightness: 30.0,
            fallback_pixels: 50,
            min_pixels: 20,
            full_confidence_pixels: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinSamplerConfig {
    pub clusters: usize,
    /// Silhouettes with more points than this are used as the face outline.
    pub min_silhouette_points: usize,
    /// Shrink factor applied to the silhouette about its centroid.
    pub silhouette_scale: f32,
    /// Ellipse fallback radii as fractions of the half box size.
    pub ellipse_scale_x: f32,
    pub ellipse_scale_y: f32,
    /// Iris-circle eye exclusion: multiple of the first iris radius.
    pub eye_radius_scale: f32,
    /// Iris-circle radius as a fraction of face width when only the centre is known.
    pub eye_radius_fallback: f32,
    /// Accepted brightness is the open interval (min, max).
    pub min_brightness: f32,
    pub max_brightness: f32,
    pub min_pixels: usize,
    pub full_confidence_pixels: usize,
}

impl Default for SkinSamplerConfig {
    fn default() -> Self {
        Self {
            clusters: 4,
            min_silhouette_points: 10,
            silhouette_scale: 0.95,
            ellipse_scale_x: 0.9,
            ellipse_scale_y: 0.95,
            eye_radius_scale: 2.0,
            eye_radius_fallback: 0.08,
            min_brightness: 40.0,
            max_brightness: 240.0,
            min_pixels: 100,
            full_confidence_pixels: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HairSamplerConfig {
    pub clusters: usize,
    /// Crop padding as fractions of the face box.
    pub top_padding: f32,
    pub side_padding: f32,
    pub bottom_extent: f32,
    /// Crops this small in either dimension are rejected.
    pub min_crop_size: u32,
    pub min_silhouette_points: usize,
    pub silhouette_scale: f32,
    pub ellipse_scale: f32,
    /// Forehead floor when eyebrows are missing, as a fraction of face height.
    pub forehead_fallback: f32,
    /// Forehead strip margins as fractions of face width.
    pub forehead_inset: f32,
    pub forehead_vertical_margin: f32,
    /// Eye exclusion radius as a fraction of face width.
    pub eye_exclusion_radius: f32,
    /// Corner patch side as a fraction of the smaller crop dimension.
    pub corner_fraction: f32,
    pub min_corner_size: u32,
    pub background_clusters: usize,
    pub background_distance: f32,
    /// Looser background distance within a corner size of the crop edge.
    pub edge_background_distance: f32,
    pub max_lightness: f32,
    /// Pixels this desaturated and this light are treated as background.
    pub gray_saturation: f32,
    pub gray_lightness: f32,
    pub skin_distance: f32,
    pub forehead_skin_distance: f32,
    /// How far the forehead band extends past the strip, in pixels.
    pub forehead_band_margin: f32,
    pub default_skin: [u8; 3],
    pub default_background: [u8; 3],
    pub min_skin_samples: usize,
    pub min_background_samples: usize,
    pub min_pixels: usize,
    pub full_confidence_pixels: usize,
}

impl Default for HairSamplerConfig {
    fn default() -> Self {
        Self {
            clusters: 5,
            top_padding: 0.6,
            side_padding: 0.3,
            bottom_extent: 0.5,
            min_crop_size: 10,
            min_silhouette_points: 10,
            silhouette_scale: 0.95,
            ellipse_scale: 0.9,
            forehead_fallback: 0.3,
            forehead_inset: 0.1,
            forehead_vertical_margin: 5.0,
            eye_exclusion_radius: 0.08,
            corner_fraction: 0.12,
            min_corner_size: 8,
            background_clusters: 3,
            background_distance: 40.0,
            edge_background_distance: 60.0,
            max_lightness: 90.0,
            gray_saturation: 10.0,
            gray_lightness: 65.0,
            skin_distance: 35.0,
            forehead_skin_distance: 50.0,
            forehead_band_margin: 10.0,
            default_skin: [200, 160, 140],
            default_background: [200, 200, 200],
            min_skin_samples: 20,
            min_background_samples: 30,
            min_pixels: 50,
            full_confidence_pixels: 500,
        }
    }
}

/// Region cut around each face before sampling, as fractions of the face box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonCropConfig {
    pub side_padding: f32,
    pub top_padding: f32,
    pub bottom_padding: f32,
    /// Padding of the exported face crop, as a fraction of the longer box side.
    pub face_padding: f32,
}

impl Default for PersonCropConfig {
    fn default() -> Self {
        Self {
            side_padding: 0.4,
            top_padding: 0.8,
            bottom_padding: 0.15,
            face_padding: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub eye: EyeSamplerConfig,
    pub skin: SkinSamplerConfig,
    pub hair: HairSamplerConfig,
    pub cluster: ClusterConfig,
    pub person_crop: PersonCropConfig,
}

impl AnalyzerConfig {
    /// Read a JSON config file; missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if self.eye.clusters == 0 || self.skin.clusters == 0 || self.hair.clusters == 0 {
            return invalid("cluster counts must be positive");
        }
        if self.hair.background_clusters == 0 {
            return invalid("hair.background_clusters must be positive");
        }
        if !(0.0..=1.0).contains(&self.eye.inner_radius)
            || self.eye.inner_radius > self.eye.outer_radius
        {
            return invalid("eye radii must satisfy 0 <= inner_radius <= outer_radius");
        }
        if !(self.eye.radial_step.is_finite() && self.eye.radial_step > 0.0) || self.eye.angle_step_degrees == 0 {
            return invalid("eye sampling steps must be positive");
        }
        if self.eye.full_confidence_pixels == 0
            || self.skin.full_confidence_pixels == 0
            || self.hair.full_confidence_pixels == 0
        {
            return invalid("full_confidence_pixels must be positive");
        }
        if self.skin.min_brightness >= self.skin.max_brightness {
            return invalid("skin brightness bounds are inverted");
        }
        let distances = [
            self.hair.background_distance,
            self.hair.edge_background_distance,
            self.hair.skin_distance,
            self.hair.forehead_skin_distance,
        ];
        if distances.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return invalid("hair color distances must be non-negative");
        }
        let paddings = [
            self.hair.top_padding,
            self.hair.side_padding,
            self.person_crop.side_padding,
            self.person_crop.top_padding,
            self.person_crop.bottom_padding,
            self.person_crop.face_padding,
        ];
        if paddings.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return invalid("crop paddings must be non-negative");
        }
        Ok(())
    }
}
