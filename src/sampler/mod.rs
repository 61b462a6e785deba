//! Region samplers: pick the pixels of one facial region, reduce them to a
//! dominant color and classify it.
//!
//! Samplers only read the image. Each returns a [`Sampled`] value holding the
//! classification and, when requested, an RGBA crop of what it looked at.

mod eye;
mod hair;
mod skin;

pub use eye::sample_eye_color;
pub use hair::sample_hair_color;
pub use skin::sample_skin_tone;

use rand::Rng;

use crate::attribute::ColorClassification;
use crate::cluster::{dominant_color, DominantColor};
use crate::color::Rgb;
use crate::config::ClusterConfig;
use crate::pixels::PixelBuffer;

/// State shared by the samplers of one analysis run.
pub struct SamplingContext<'a, R: Rng + ?Sized> {
    pub cluster: &'a ClusterConfig,
    pub rng: &'a mut R,
    /// Produce debug crops alongside the classifications.
    pub capture_crops: bool,
}

impl<'a, R: Rng + ?Sized> SamplingContext<'a, R> {
    pub fn new(cluster: &'a ClusterConfig, rng: &'a mut R) -> Self {
        Self {
            cluster,
            rng,
            capture_crops: false,
        }
    }

    pub fn with_crops(mut self, capture: bool) -> Self {
        self.capture_crops = capture;
        self
    }

    pub(crate) fn dominant(&mut self, samples: &[Rgb], k: usize) -> Option<DominantColor> {
        dominant_color(samples, k, self.cluster, &mut *self.rng)
    }
}

/// A sampler's result plus its optional debug crop.
#[derive(Debug, Clone)]
pub struct Sampled<A> {
    pub classification: ColorClassification<A>,
    pub crop: Option<PixelBuffer>,
}

impl<A> Sampled<A> {
    pub(crate) fn new(classification: ColorClassification<A>, crop: Option<PixelBuffer>) -> Self {
        Self {
            classification,
            crop,
        }
    }
}
