//! Frame and region types.
//!
//! - `Frame`: one RGB image from the source, resized to the run's fixed size.
//! - `Region`: axis-aligned box in frame coordinates. Signed, so detector
//!   output that spills past the frame edge is representable until clipped.
//!
//! Frames live for a single detection cycle. Nothing here is persisted.

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Default frame width used when a run does not configure one.
pub const DEFAULT_FRAME_WIDTH: u32 = 800;
/// Default frame height used when a run does not configure one.
pub const DEFAULT_FRAME_HEIGHT: u32 = 600;

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// A single RGB frame (three 8-bit channels).
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    /// Wrap an RGB image as-is.
    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }

    /// Build a frame from packed RGB bytes.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("frame buffer does not fit {}x{}", width, height))?;
        Ok(Self { image })
    }

    /// A frame filled with one color.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb(color)),
        }
    }

    /// Resize to the run's fixed frame size. No-op when already sized.
    pub fn fit_to(self, width: u32, height: u32) -> Self {
        if self.image.width() == width && self.image.height() == height {
            return self;
        }
        Self {
            image: imageops::resize(&self.image, width, height, FilterType::Triangle),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whole-frame region.
    pub fn bounds(&self) -> Region {
        Region::new(0, 0, self.width() as i32, self.height() as i32)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    pub fn as_image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    /// Iterate the pixels inside `region` after clipping it to the frame.
    ///
    /// A region that misses the frame entirely yields nothing.
    pub fn region_pixels(&self, region: Region) -> impl Iterator<Item = [u8; 3]> + '_ {
        let clipped = region.clip_to(self.width(), self.height());
        let (x0, y0, x1, y1) = match clipped {
            Some(r) => (r.x as u32, r.y as u32, r.right() as u32, r.bottom() as u32),
            None => (0, 0, 0, 0),
        };
        (y0..y1).flat_map(move |y| (x0..x1).map(move |x| self.image.get_pixel(x, y).0))
    }
}

// ----------------------------------------------------------------------------
// Region
// ----------------------------------------------------------------------------

/// Axis-aligned bounding box `(x, y, width, height)` in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-size box at the origin. Marks an item that was looked for but not found.
    pub const fn empty() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Box from corner coordinates.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Intersect with the `width`×`height` frame rectangle.
    ///
    /// Returns `None` when nothing of the box lies inside the frame.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Region> {
        let max_x = width.min(i32::MAX as u32) as i32;
        let max_y = height.min(i32::MAX as u32) as i32;
        let x0 = self.x.clamp(0, max_x);
        let y0 = self.y.clamp(0, max_y);
        let x1 = self.right().clamp(0, max_x);
        let y1 = self.bottom().clamp(0, max_y);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Region::from_corners(x0, y0, x1, y1))
    }

    /// Multiply every coordinate by `factor`.
    pub fn scaled(&self, factor: i32) -> Region {
        Region::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.width, self.height)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
