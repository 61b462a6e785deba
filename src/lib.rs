//! # tint-face
//!
//! Eye color, hair color and skin tone for every face in a photograph,
//! measured from detector landmarks and the image pixels.
//!
//! This crate provides:
//! - **Region sampling**: iris annulus, face interior minus the eyes, and the
//!   area around the head with background, skin and face masked out
//! - **Dominant colors**: k-means++ clustering over the sampled RGB pixels
//! - **Classification**: perceptual categories over HSL, the nearest named
//!   reference color, and a sample-size confidence
//! - **Reports**: per-person JSON records combining the colors with head
//!   pose, gaze, gesture, emotion and body data from the detector
//!
//! ## Pipeline
//!
//! 1. A [`Detector`] turns the image into a [`DetectionResult`]
//! 2. Each face is cropped to a padded person region
//! 3. The eye, hair and skin samplers gather their pixels
//! 4. Each sample is reduced to a dominant color and classified
//! 5. Faces, bodies and hands are assembled into an [`AnalysisReport`]
//!
//! Regions without enough usable pixels are not errors: they come back as
//! [`ColorClassification::Unknown`] with a reason and zero confidence.
//!
//! ## Quick Start
//!
//! ```rust
//! use tint_face::{
//!     analyze_detections, AnalyzeOptions, AnalyzerConfig, BoundingBox, DetectionResult,
//!     FaceDetection, PixelBuffer,
//! };
//!
//! // Any RGBA image; here a uniform skin-colored frame.
//! let image = PixelBuffer::from_fn(320, 240, |_, _| [190, 150, 125, 255]);
//!
//! // Detections usually come from a detector or a stored detection file.
//! let detections = DetectionResult {
//!     faces: vec![FaceDetection::from_box(BoundingBox::new(110.0, 80.0, 100.0, 120.0))],
//!     ..Default::default()
//! };
//!
//! let report = analyze_detections(
//!     &detections,
//!     &image,
//!     &AnalyzerConfig::default(),
//!     &AnalyzeOptions::default(),
//! )?;
//! let face = report.people[0].face.as_ref().unwrap();
//! assert!(face.colors.skin_tone.confidence() > 0);
//! // No iris landmarks, so no eye color.
//! assert_eq!(face.colors.eye_color.confidence(), 0);
//! # Ok::<(), tint_face::Error>(())
//! ```
//!
//! ## Custom Image Types
//!
//! Samplers read pixels through the [`PixelAccess`] trait:
//!
//! ```rust
//! use tint_face::PixelAccess;
//!
//! struct MyImage { /* ... */ }
//!
//! impl PixelAccess for MyImage {
//!     fn rgba(&self, x: i32, y: i32) -> Option<[u8; 4]> {
//!         // Return None for out-of-bounds
//!         None
//!     }
//!     fn width(&self) -> u32 { 640 }
//!     fn height(&self) -> u32 { 480 }
//! }
//! ```

mod analyzer;
pub mod attribute;
pub mod classify;
pub mod cluster;
pub mod color;
pub mod config;
pub mod detection;
mod error;
pub mod geometry;
pub mod naming;
mod pixels;
pub mod pose;
pub mod report;
pub mod sampler;
#[cfg(feature = "rustface")]
mod seeta;
mod types;

pub use analyzer::{analyze_detections, AnalyzeOptions, Analyzer, Detector, PersonWindow, RecordedDetector};
pub use attribute::{ColorClassification, EyeColor, HairColor, MeasuredColor, UnknownReason};
pub use classify::{EyeCategory, HairCategory, SkinTone, SkinToneCategory};
pub use cluster::{dominant_color, DominantColor};
pub use color::{hsl_to_rgb, rgb_to_hsl, Hsl, Rgb};
pub use config::AnalyzerConfig;
pub use detection::{DetectionResult, FaceDetection, Landmarks};
pub use error::{Error, Result};
pub use naming::{nearest_named_color, NamedColor};
pub use pixels::{PixelAccess, PixelBuffer};
pub use report::{AnalysisReport, PersonRecord};
#[cfg(feature = "rustface")]
pub use seeta::RustfaceDetector;
pub use types::{BoundingBox, Point};
