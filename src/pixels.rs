use std::path::Path;

use image::RgbaImage;

use crate::color::Rgb;
use crate::error::{Error, Result};

/// Trait for reading RGBA samples from an image.
pub trait PixelAccess {
    /// Get the RGBA sample at (x, y). Returns `None` for out-of-bounds pixels.
    fn rgba(&self, x: i32, y: i32) -> Option<[u8; 4]>;

    /// Image dimensions.
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// The RGB part of the sample at (x, y), ignoring alpha.
    fn rgb(&self, x: i32, y: i32) -> Option<Rgb> {
        self.rgba(x, y).map(|[r, g, b, _]| Rgb::new(r, g, b))
    }
}

/// A row-major RGBA pixel buffer.
///
/// Analysis only ever reads from a caller's buffer; crops and masks are
/// written into freshly allocated buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(Error::InvalidPixelBuffer {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// A fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> [u8; 4],
    {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Load and decode an image file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(image::open(path)?.to_rgba8().into())
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Overwrite one sample. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        if let Some(i) = self.index(x, y) {
            self.data[i..i + 4].copy_from_slice(&rgba);
        }
    }

    /// Copy a rectangle into a new buffer, clamped to this buffer's bounds.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let width = width.min(self.width - x);
        let height = height.min(self.height - y);

        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for row in y..y + height {
            let start = (row as usize * self.width as usize + x as usize) * 4;
            data.extend_from_slice(&self.data[start..start + width as usize * 4]);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Grayscale luma plane, for detectors that work on intensity images.
    pub fn to_luma(&self) -> Vec<u8> {
        self.data
            .chunks_exact(4)
            .map(|p| {
                let l = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
                l.round().clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image = RgbaImage::from_raw(self.width, self.height, self.data.clone()).ok_or(
            Error::InvalidPixelBuffer {
                len: self.data.len(),
                width: self.width,
                height: self.height,
            },
        )?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

impl PixelAccess for PixelBuffer {
    fn rgba(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let i = self.index(x, y)?;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
        }
    }
}
