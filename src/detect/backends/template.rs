//! Template-matching clothing detector.
//!
//! Each clothing label has one reference template. Per frame:
//!
//! 1. the frame is downsampled by `DOWNSAMPLE`,
//! 2. the template is resized to a `TEMPLATE_DIVISOR`-th of the downsampled
//!    frame in each dimension,
//! 3. both are matched with the zero-mean normalized correlation
//!    coefficient over all three color channels,
//! 4. every location scoring at least `MATCH_THRESHOLD` becomes one
//!    `correct = true` item, scaled back to full-frame coordinates.
//!
//! A label with no location over the threshold yields a single zero-size
//! item with `correct = false`. This is a presence test, not localization:
//! neighbouring hits are not merged.

use anyhow::Result;
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::detect::backend::Detector;
use crate::detect::item::{DetectedItem, Label};
use crate::frame::{Frame, Region};

/// Frame downsampling factor before matching.
pub const DOWNSAMPLE: u32 = 2;
/// Template edge length as a fraction of the downsampled frame.
pub const TEMPLATE_DIVISOR: u32 = 4;
/// Minimum correlation coefficient for a match.
pub const MATCH_THRESHOLD: f32 = 0.6;

/// Below this the window (or template) is treated as flat and cannot match.
const FLAT_VARIANCE: f64 = 1e-6;

/// A reference image for one clothing label.
#[derive(Clone, Debug)]
pub struct ClothingTemplate {
    pub label: Label,
    pub image: RgbImage,
}

impl ClothingTemplate {
    pub fn new(label: Label, image: RgbImage) -> Self {
        Self { label, image }
    }
}

/// Presence detector over a fixed set of clothing templates.
#[derive(Clone, Debug)]
pub struct TemplateDetector {
    templates: Vec<ClothingTemplate>,
    threshold: f32,
}

impl TemplateDetector {
    /// Templates are matched in the order given.
    pub fn new(templates: Vec<ClothingTemplate>) -> Self {
        Self {
            templates,
            threshold: MATCH_THRESHOLD,
        }
    }

    /// Override the default match threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn detect_items(&self, frame: &Frame) -> Vec<DetectedItem> {
        let small_w = (frame.width() / DOWNSAMPLE).max(1);
        let small_h = (frame.height() / DOWNSAMPLE).max(1);
        let small = imageops::resize(frame.as_image(), small_w, small_h, FilterType::Triangle);
        let scene = ColorPlanes::new(&small);

        let tpl_w = (small_w / TEMPLATE_DIVISOR).max(1);
        let tpl_h = (small_h / TEMPLATE_DIVISOR).max(1);
        let factor = DOWNSAMPLE as i32;

        let mut items = Vec::new();
        for template in &self.templates {
            let resized = imageops::resize(&template.image, tpl_w, tpl_h, FilterType::Triangle);
            let plane = ColorPlanes::new(&resized);
            let hits = match_locations(&scene, &plane, self.threshold);
            log::debug!(
                "template {}: {} location(s) >= {:.2}",
                template.label,
                hits.len(),
                self.threshold
            );
            if hits.is_empty() {
                items.push(DetectedItem::judged(template.label, Region::empty(), false));
                continue;
            }
            for (x, y) in hits {
                let bbox = Region::new(x as i32, y as i32, tpl_w as i32, tpl_h as i32);
                items.push(DetectedItem::judged(template.label, bbox.scaled(factor), true));
            }
        }
        items
    }
}

impl Default for TemplateDetector {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Detector for TemplateDetector {
    fn name(&self) -> &'static str {
        "template"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedItem>> {
        Ok(self.detect_items(frame))
    }
}

// ----------------------------------------------------------------------------
// Correlation coefficient matching
// ----------------------------------------------------------------------------

/// One color channel with summed-area tables for O(1) window statistics.
struct ChannelPlane {
    values: Vec<f64>,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl ChannelPlane {
    fn new(image: &RgbImage, channel: usize) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let values: Vec<f64> = image.pixels().map(|p| p.0[channel] as f64).collect();
        let stride = width + 1;
        let mut sum = vec![0.0; stride * (height + 1)];
        let mut sum_sq = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0;
            let mut row_sq = 0.0;
            for x in 0..width {
                let v = values[y * width + x];
                row += v;
                row_sq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row;
                sum_sq[(y + 1) * stride + x + 1] = sum_sq[y * stride + x + 1] + row_sq;
            }
        }
        Self {
            values,
            sum,
            sum_sq,
        }
    }
}

/// The R, G and B planes of an image.
struct ColorPlanes {
    width: usize,
    height: usize,
    channels: [ChannelPlane; 3],
}

impl ColorPlanes {
    fn new(image: &RgbImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            channels: [0, 1, 2].map(|c| ChannelPlane::new(image, c)),
        }
    }

    /// Sum and sum of squares of `channel` over the `w`×`h` window at `(x, y)`.
    fn window(&self, channel: usize, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let plane = &self.channels[channel];
        let stride = self.width + 1;
        let at = |table: &[f64], xx: usize, yy: usize| table[yy * stride + xx];
        let s = at(&plane.sum, x + w, y + h) - at(&plane.sum, x, y + h) - at(&plane.sum, x + w, y)
            + at(&plane.sum, x, y);
        let sq = at(&plane.sum_sq, x + w, y + h)
            - at(&plane.sum_sq, x, y + h)
            - at(&plane.sum_sq, x + w, y)
            + at(&plane.sum_sq, x, y);
        (s, sq)
    }
}

/// Correlation coefficient of `template` at every placement inside `scene`,
/// row-major, `(scene.w - tpl.w + 1) * (scene.h - tpl.h + 1)` entries.
///
/// Each channel is centered on its own mean; the cross terms and energies
/// are summed over the three channels before normalizing, so a pattern
/// carried only by hue still correlates. The cross term is a direct
/// O(out_w·out_h·tw·th) loop, far slower than one tick on full-size frames.
fn correlation_map(scene: &ColorPlanes, template: &ColorPlanes) -> (usize, usize, Vec<f32>) {
    if template.width > scene.width || template.height > scene.height {
        return (0, 0, Vec::new());
    }
    let (tw, th) = (template.width, template.height);
    let n = (tw * th) as f64;
    let centered: Vec<Vec<f64>> = template
        .channels
        .iter()
        .map(|plane| {
            let mean = plane.values.iter().sum::<f64>() / n;
            plane.values.iter().map(|v| v - mean).collect()
        })
        .collect();
    let t_energy: f64 = centered.iter().flatten().map(|v| v * v).sum();

    let out_w = scene.width - tw + 1;
    let out_h = scene.height - th + 1;
    let mut scores = vec![0.0f32; out_w * out_h];
    if t_energy < FLAT_VARIANCE {
        return (out_w, out_h, scores);
    }

    for y in 0..out_h {
        for x in 0..out_w {
            let w_energy: f64 = (0..3)
                .map(|c| {
                    let (s, sq) = scene.window(c, x, y, tw, th);
                    sq - s * s / n
                })
                .sum();
            if w_energy < FLAT_VARIANCE {
                continue;
            }
            let mut cross = 0.0;
            for (plane, tpl) in scene.channels.iter().zip(&centered) {
                for ty in 0..th {
                    let scene_row = &plane.values[(y + ty) * scene.width + x..][..tw];
                    let tpl_row = &tpl[ty * tw..][..tw];
                    cross += scene_row
                        .iter()
                        .zip(tpl_row)
                        .map(|(a, b)| a * b)
                        .sum::<f64>();
                }
            }
            scores[y * out_w + x] = (cross / (t_energy * w_energy).sqrt()) as f32;
        }
    }
    (out_w, out_h, scores)
}

/// Top-left corners (in `scene` coordinates) scoring at least `threshold`,
/// row-major.
fn match_locations(
    scene: &ColorPlanes,
    template: &ColorPlanes,
    threshold: f32,
) -> Vec<(u32, u32)> {
    let (out_w, _out_h, scores) = correlation_map(scene, template);
    scores
        .iter()
        .enumerate()
        .filter(|(_, &score)| score >= threshold)
        .map(|(i, _)| ((i % out_w) as u32, (i / out_w) as u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn checker(width: u32, height: u32, cell: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Rgb([240, 240, 240])
            } else {
                Rgb([20, 20, 20])
            }
        })
    }

    #[test]
    fn identical_patch_scores_one() {
        let scene_img = RgbImage::from_fn(12, 10, |x, y| {
            Rgb([
                ((x * 17 + y * 31) % 251) as u8,
                ((x * 5 + y * 11) % 97) as u8,
                ((x * y) % 61) as u8,
            ])
        });
        let patch = imageops::crop_imm(&scene_img, 3, 2, 5, 4).to_image();
        let scene = ColorPlanes::new(&scene_img);
        let tpl = ColorPlanes::new(&patch);
        let (out_w, _, scores) = correlation_map(&scene, &tpl);
        let best = scores[2 * out_w + 3];
        assert!((best - 1.0).abs() < 1e-4, "score {}", best);
    }

    /// Red and green cells of equal luma: the pattern exists only in hue.
    fn hue_checker(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if ((x / 4) + (y / 4)) % 2 == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 76, 0])
            }
        })
    }

    #[test]
    fn hue_only_pattern_matches_its_copy() {
        let mut scene_img = RgbImage::from_pixel(30, 24, Rgb([128, 128, 128]));
        let patch = hue_checker(12, 8);
        imageops::replace(&mut scene_img, &patch, 9, 6);
        let hits = match_locations(
            &ColorPlanes::new(&scene_img),
            &ColorPlanes::new(&patch),
            MATCH_THRESHOLD,
        );
        assert!(hits.contains(&(9, 6)), "hits {:?}", hits);
    }

    #[test]
    fn recolored_pattern_scores_below_threshold() {
        let template = checker(16, 16, 4);
        let recolored = RgbImage::from_fn(16, 16, |x, y| {
            if ((x / 4) + (y / 4)) % 2 == 0 {
                Rgb([0, 0, 240])
            } else {
                Rgb([0, 0, 20])
            }
        });
        let (_, _, scores) = correlation_map(
            &ColorPlanes::new(&recolored),
            &ColorPlanes::new(&template),
        );
        assert_eq!(scores.len(), 1);
        assert!(scores[0] < MATCH_THRESHOLD, "score {}", scores[0]);
    }

    #[test]
    fn flat_template_never_matches() {
        let scene = ColorPlanes::new(&RgbImage::from_fn(8, 8, |x, _| Rgb([x as u8 * 20, 0, 0])));
        let tpl = ColorPlanes::new(&RgbImage::from_pixel(3, 3, Rgb([128, 64, 32])));
        assert!(match_locations(&scene, &tpl, 0.1).is_empty());
    }

    #[test]
    fn oversized_template_yields_no_locations() {
        let scene = ColorPlanes::new(&RgbImage::new(4, 4));
        let tpl = ColorPlanes::new(&RgbImage::new(5, 5));
        assert!(match_locations(&scene, &tpl, 0.0).is_empty());
    }

    #[test]
    fn absent_template_yields_single_placeholder() {
        let mut detector =
            TemplateDetector::new(vec![ClothingTemplate::new(Label::Shoes, checker(40, 30, 5))]);
        let items = detector.detect(&Frame::filled(160, 120, [90, 90, 90])).unwrap();
        assert_eq!(
            items,
            vec![DetectedItem::judged(Label::Shoes, Region::empty(), false)]
        );
    }

    #[test]
    fn all_black_frame_does_not_error() {
        let mut detector = TemplateDetector::new(
            Label::CLOTHING
                .iter()
                .map(|&label| ClothingTemplate::new(label, checker(40, 30, 5)))
                .collect(),
        );
        let items = detector.detect(&Frame::filled(160, 120, [0, 0, 0])).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| item.correct == Some(false)));
    }

    #[test]
    fn no_templates_no_items() {
        let mut detector = TemplateDetector::default();
        assert!(detector.detect(&Frame::filled(64, 48, [0, 0, 0])).unwrap().is_empty());
    }
}
