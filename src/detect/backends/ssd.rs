//! Person detection with a MobileNet-SSD style network.
//!
//! The network itself sits behind `SsdModel` so the pre/post-processing
//! here stays independent of the inference runtime. Input is a 300×300 RGB
//! blob normalized as `(p - 127.5) * 0.007843`; output is a list of
//! `[image_id, class, confidence, x1, y1, x2, y2]` rows with box corners in
//! 0..1 frame-relative units.
//!
//! Clothing is not something this network knows about. `ClothingStage`
//! decides where clothing items come from: the template matcher, or the
//! fixed placeholder boxes, which must be asked for explicitly.

use anyhow::Result;
use image::imageops::{self, FilterType};

use super::template::TemplateDetector;
use crate::detect::backend::Detector;
use crate::detect::item::{DetectedItem, Label};
use crate::frame::{Frame, Region};

/// Network input edge length.
pub const SSD_INPUT_SIZE: u32 = 300;
/// Pixel scale applied after mean subtraction.
pub const SSD_SCALE: f32 = 0.007843;
/// Mean subtracted from every channel.
pub const SSD_MEAN: f32 = 127.5;
/// Detections at or below this confidence are dropped.
pub const SSD_CONFIDENCE: f32 = 0.2;

/// Class list the network was trained on (PASCAL VOC plus background).
pub const VOC_CLASSES: [&str; 21] = [
    "background",
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

/// One raw output row: `[image_id, class, confidence, x1, y1, x2, y2]`.
pub type SsdRow = [f32; 7];

/// Inference runtime for the SSD network.
pub trait SsdModel: Send {
    /// Run one forward pass on a `1×3×300×300` CHW blob.
    fn forward(&mut self, blob: &[f32]) -> Result<Vec<SsdRow>>;
}

/// Where clothing items come from.
pub enum ClothingStage {
    /// Locate clothing with the template matcher.
    Templates(TemplateDetector),
    /// Fixed boxes that are not real detections. Opt-in only.
    LegacyPlaceholders,
    /// Persons only.
    Disabled,
}

/// Fixed clothing boxes, `(label, x, y, width, height)`.
const PLACEHOLDER_BOXES: [(Label, i32, i32, i32, i32); 3] = [
    (Label::TShirt, 100, 100, 150, 150),
    (Label::Pants, 100, 250, 150, 300),
    (Label::Shoes, 100, 450, 150, 500),
];

/// Person detector plus a clothing stage.
pub struct SsdDetector<M> {
    model: Option<M>,
    clothing: ClothingStage,
    confidence: f32,
}

impl<M: SsdModel> SsdDetector<M> {
    /// `model` is `None` when the network could not be loaded; the person
    /// stage then reports nobody.
    pub fn new(model: Option<M>, clothing: ClothingStage) -> Self {
        if model.is_none() {
            log::warn!("ssd model unavailable; person detection disabled");
        }
        Self {
            model,
            clothing,
            confidence: SSD_CONFIDENCE,
        }
    }

    /// Override the default confidence cut-off.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    fn detect_persons(&mut self, frame: &Frame) -> Result<Vec<DetectedItem>> {
        let Some(model) = self.model.as_mut() else {
            return Ok(Vec::new());
        };
        let rows = model.forward(&build_blob(frame))?;
        Ok(decode_persons(
            &rows,
            frame.width(),
            frame.height(),
            self.confidence,
        ))
    }
}

impl<M: SsdModel> Detector for SsdDetector<M> {
    fn name(&self) -> &'static str {
        "ssd"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedItem>> {
        let mut items = self.detect_persons(frame)?;
        match &mut self.clothing {
            ClothingStage::Templates(templates) => items.extend(templates.detect(frame)?),
            ClothingStage::LegacyPlaceholders => items.extend(placeholder_items()),
            ClothingStage::Disabled => {}
        }
        Ok(items)
    }

    fn requires_person(&self) -> bool {
        true
    }

    /// One pass on a blank input so the first live frame is not slow.
    fn warm_up(&mut self) -> Result<()> {
        if let Some(model) = self.model.as_mut() {
            let blank = Frame::filled(SSD_INPUT_SIZE, SSD_INPUT_SIZE, [0, 0, 0]);
            model.forward(&build_blob(&blank))?;
        }
        Ok(())
    }
}

/// Resize to the network input and lay out as normalized CHW floats.
pub fn build_blob(frame: &Frame) -> Vec<f32> {
    let resized = imageops::resize(
        frame.as_image(),
        SSD_INPUT_SIZE,
        SSD_INPUT_SIZE,
        FilterType::Triangle,
    );
    let plane = (SSD_INPUT_SIZE * SSD_INPUT_SIZE) as usize;
    let mut blob = vec![0.0f32; plane * 3];
    for (i, pixel) in resized.pixels().enumerate() {
        for channel in 0..3 {
            blob[channel * plane + i] = (pixel.0[channel] as f32 - SSD_MEAN) * SSD_SCALE;
        }
    }
    blob
}

/// Keep confident "person" rows and map them to frame pixel boxes.
pub fn decode_persons(
    rows: &[SsdRow],
    width: u32,
    height: u32,
    min_confidence: f32,
) -> Vec<DetectedItem> {
    let (w, h) = (width as f32, height as f32);
    rows.iter()
        .filter(|row| row[2] > min_confidence)
        .filter(|row| {
            let class = row[1];
            class >= 0.0 && VOC_CLASSES.get(class as usize) == Some(&"person")
        })
        .map(|row| {
            let x1 = (row[3] * w) as i32;
            let y1 = (row[4] * h) as i32;
            let x2 = (row[5] * w) as i32;
            let y2 = (row[6] * h) as i32;
            DetectedItem::new(Label::Person, Region::from_corners(x1, y1, x2, y2))
        })
        .collect()
}

fn placeholder_items() -> impl Iterator<Item = DetectedItem> {
    PLACEHOLDER_BOXES
        .iter()
        .map(|&(label, x, y, w, h)| DetectedItem::new(label, Region::new(x, y, w, h)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct FixedModel(Vec<SsdRow>);

    impl SsdModel for FixedModel {
        fn forward(&mut self, blob: &[f32]) -> Result<Vec<SsdRow>> {
            if blob.len() != 3 * 300 * 300 {
                return Err(anyhow!("unexpected blob length {}", blob.len()));
            }
            Ok(self.0.clone())
        }
    }

    #[test]
    fn decode_keeps_confident_persons_only() {
        let rows = vec![
            [0.0, 15.0, 0.9, 0.1, 0.2, 0.5, 0.8],
            [0.0, 15.0, 0.2, 0.1, 0.2, 0.5, 0.8],
            [0.0, 7.0, 0.95, 0.0, 0.0, 1.0, 1.0],
            [0.0, 99.0, 0.95, 0.0, 0.0, 1.0, 1.0],
        ];
        let items = decode_persons(&rows, 800, 600, SSD_CONFIDENCE);
        assert_eq!(
            items,
            vec![DetectedItem::new(
                Label::Person,
                Region::new(80, 120, 320, 360)
            )]
        );
    }

    #[test]
    fn blob_is_normalized_chw() {
        let blob = build_blob(&Frame::filled(40, 30, [255, 127, 0]));
        let plane = 300 * 300;
        assert_eq!(blob.len(), plane * 3);
        assert!((blob[0] - 0.999_98).abs() < 1e-3);
        assert!((blob[plane] - (-0.003_92)).abs() < 1e-3);
        assert!((blob[2 * plane] - (-0.999_98)).abs() < 1e-3);
    }

    #[test]
    fn missing_model_reports_no_persons() {
        let mut detector = SsdDetector::<FixedModel>::new(None, ClothingStage::Disabled);
        assert!(detector.detect(&Frame::filled(80, 60, [0, 0, 0])).unwrap().is_empty());
        assert!(detector.requires_person());
    }

    #[test]
    fn legacy_placeholders_follow_person_items() {
        let model = FixedModel(vec![[0.0, 15.0, 0.8, 0.0, 0.0, 0.5, 0.5]]);
        let mut detector = SsdDetector::new(Some(model), ClothingStage::LegacyPlaceholders);
        let items = detector.detect(&Frame::filled(800, 600, [0, 0, 0])).unwrap();
        let labels: Vec<Label> = items.iter().map(|i| i.label).collect();
        assert_eq!(
            labels,
            vec![Label::Person, Label::TShirt, Label::Pants, Label::Shoes]
        );
        assert_eq!(items[2].bbox, Region::new(100, 250, 150, 300));
    }

    #[test]
    fn template_stage_items_are_rejudged_by_color() {
        use crate::compliance::{ColorPolicy, CompliancePolicy};
        use crate::detect::ClothingTemplate;
        use image::{Rgb, RgbImage};

        let shirt = RgbImage::from_fn(40, 30, |x, y| {
            if ((x / 10) + (y / 10)) % 2 == 0 {
                Rgb([200, 30, 30])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let mut scene = RgbImage::from_pixel(160, 120, Rgb([128, 128, 128]));
        imageops::replace(&mut scene, &shirt, 40, 60);
        let frame = Frame::from_image(scene);

        let templates = TemplateDetector::new(vec![
            ClothingTemplate::new(Label::TShirt, shirt),
            ClothingTemplate::new(Label::Pants, RgbImage::from_pixel(40, 30, Rgb([5, 5, 5]))),
        ]);
        let model = FixedModel(vec![[0.0, 15.0, 0.9, 0.0, 0.0, 1.0, 1.0]]);
        let mut detector = SsdDetector::new(Some(model), ClothingStage::Templates(templates));

        let mut items = detector.detect(&frame).unwrap();
        assert_eq!(items[0], DetectedItem::new(Label::Person, Region::new(0, 0, 160, 120)));
        let shirts: Vec<&DetectedItem> =
            items.iter().filter(|i| i.label == Label::TShirt).collect();
        assert!(!shirts.is_empty());
        assert!(shirts.iter().all(|i| i.correct == Some(true)));
        assert_eq!(items.last().map(|i| i.label), Some(Label::Pants));
        assert!(items.last().is_some_and(|i| i.bbox.is_empty()));

        let verdicts = ColorPolicy::new().evaluate(&frame, &mut items);
        assert!(items
            .iter()
            .filter(|i| i.label.is_clothing())
            .all(|i| i.correct == Some(false)));
        assert!(verdicts.contains(&"Not Allowed: T-shirt color is incorrect".to_string()));
        assert_eq!(
            verdicts.last().map(String::as_str),
            Some("Not Allowed: Pants color is incorrect")
        );
    }
}
