//! Classified color attributes.
//!
//! A [`ColorClassification`] is either a measured color with its category,
//! names, and statistics, or an explicit `Unknown` carrying the reason the
//! region could not be measured. Both serialize to the same flat JSON shape
//! the downstream consumers read:
//!
//! ```json
//! {"color": "dark brown", "colorName": "Dark Brown", "simpleColorName": "brown", ...}
//! {"color": "unknown", "confidence": 0, "reason": "insufficient iris pixels", "pixelCount": 4}
//! ```

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::classify::{EyeCategory, HairCategory, SkinTone};
use crate::cluster::{ClusterShare, DominantColor};
use crate::color::{Hsl, Rgb};
use crate::naming::nearest_named_color;

/// A per-region attribute payload.
pub trait Attribute: Serialize {
    /// Key of the label field, set to `"unknown"` when nothing was measured.
    const LABEL_KEY: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EyeColor {
    pub color: EyeCategory,
}

impl Attribute for EyeColor {
    const LABEL_KEY: &'static str = "color";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropSize {
    pub width: u32,
    pub height: u32,
}

/// Hair category plus the contamination estimates the sampler masked with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HairColor {
    pub color: HairCategory,
    pub crop_size: CropSize,
    pub background_colors: Vec<Rgb>,
    pub skin_color: Rgb,
}

impl Attribute for HairColor {
    const LABEL_KEY: &'static str = "color";
}

impl Attribute for SkinTone {
    const LABEL_KEY: &'static str = "tone";
}

/// Why a region produced no color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownReason {
    MissingIris,
    InvalidIrisGeometry,
    InsufficientIrisPixels,
    InsufficientPixels,
    InvalidCropRegion,
    InsufficientHairPixels,
    EmptySample,
}

impl UnknownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownReason::MissingIris => "no iris landmarks",
            UnknownReason::InvalidIrisGeometry => "invalid iris geometry",
            UnknownReason::InsufficientIrisPixels => "insufficient iris pixels",
            UnknownReason::InsufficientPixels => "insufficient pixels",
            UnknownReason::InvalidCropRegion => "invalid crop region",
            UnknownReason::InsufficientHairPixels => "insufficient hair pixels or bald",
            UnknownReason::EmptySample => "no pixels sampled",
        }
    }
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UnknownReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasuredColor<A> {
    #[serde(flatten)]
    pub attribute: A,
    /// Closest entry of the reference color table.
    pub color_name: String,
    pub simple_color_name: String,
    pub rgb: Rgb,
    pub hex: String,
    pub hsl: Hsl,
    /// 0-100, from pixel count relative to the sampler's sufficiency threshold.
    pub confidence: u8,
    pub pixel_count: usize,
    pub clusters: Vec<ClusterShare>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorClassification<A> {
    Classified(MeasuredColor<A>),
    Unknown {
        reason: UnknownReason,
        pixel_count: usize,
    },
}

impl<A> ColorClassification<A> {
    pub fn unknown(reason: UnknownReason, pixel_count: usize) -> Self {
        ColorClassification::Unknown {
            reason,
            pixel_count,
        }
    }

    pub fn measured(&self) -> Option<&MeasuredColor<A>> {
        match self {
            ColorClassification::Classified(m) => Some(m),
            ColorClassification::Unknown { .. } => None,
        }
    }

    pub fn attribute(&self) -> Option<&A> {
        self.measured().map(|m| &m.attribute)
    }

    pub fn confidence(&self) -> u8 {
        self.measured().map_or(0, |m| m.confidence)
    }

    pub fn pixel_count(&self) -> usize {
        match self {
            ColorClassification::Classified(m) => m.pixel_count,
            ColorClassification::Unknown { pixel_count, .. } => *pixel_count,
        }
    }

    pub fn reason(&self) -> Option<UnknownReason> {
        match self {
            ColorClassification::Classified(_) => None,
            ColorClassification::Unknown { reason, .. } => Some(*reason),
        }
    }
}

impl<A: Attribute> Serialize for ColorClassification<A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ColorClassification::Classified(measured) => measured.serialize(serializer),
            ColorClassification::Unknown {
                reason,
                pixel_count,
            } => {
                let mut state = serializer.serialize_struct("Unknown", 4)?;
                state.serialize_field(A::LABEL_KEY, "unknown")?;
                state.serialize_field("confidence", &0u8)?;
                state.serialize_field("reason", reason)?;
                state.serialize_field("pixelCount", pixel_count)?;
                state.end()
            }
        }
    }
}

/// `min(100, round(pixels / full * 100))`.
pub fn confidence(pixel_count: usize, full_confidence_pixels: usize) -> u8 {
    let full = full_confidence_pixels.max(1) as f32;
    (pixel_count as f32 / full * 100.0).round().min(100.0) as u8
}

/// Name, convert, and score a dominant color; `categorize` maps its HSL to
/// the region's attribute.
pub fn classify_dominant<A, F>(
    dominant: DominantColor,
    pixel_count: usize,
    full_confidence_pixels: usize,
    categorize: F,
) -> ColorClassification<A>
where
    F: FnOnce(Hsl) -> A,
{
    let rgb = dominant.color;
    let hsl = rgb.to_hsl();
    let named = nearest_named_color(rgb);

    ColorClassification::Classified(MeasuredColor {
        attribute: categorize(hsl),
        color_name: named.detailed_name,
        simple_color_name: named.simple_name,
        rgb,
        hex: rgb.hex(),
        hsl,
        confidence: confidence(pixel_count, full_confidence_pixels),
        pixel_count,
        clusters: dominant.clusters,
    })
}
