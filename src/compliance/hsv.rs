//! 8-bit HSV conversion and inclusive color ranges.
//!
//! Hue is halved to fit a byte (0..=180), saturation and value span 0..=255.

use crate::frame::{Frame, Region};

/// Inclusive HSV box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

/// Low saturation, high value.
pub const WHITE: HsvRange = HsvRange::new([0, 0, 200], [180, 30, 255]);
/// Any hue and saturation, low value.
pub const BLACK: HsvRange = HsvRange::new([0, 0, 0], [180, 255, 50]);

pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v > 0.0 { delta * 255.0 / v } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / delta
    } else if v == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        (h / 2.0).round().min(180.0) as u8,
        s.round() as u8,
        v as u8,
    ]
}

/// True when any pixel of the (clipped) region falls inside `range`.
///
/// A region that lies completely outside the frame samples nothing and so
/// never contains the color.
pub fn region_contains(frame: &Frame, region: Region, range: HsvRange) -> bool {
    frame
        .region_pixels(region)
        .any(|pixel| range.contains(rgb_to_hsv(pixel)))
}
