//! Per-frame detection and classification.
//!
//! `Pipeline::run` is a function of the frame alone: detector and policy
//! carry no state between cycles, so the same frame always produces the same
//! report. Rendering the report is the caller's business.
//!
//! The detector/policy pairing is fixed at build time through the type
//! parameters; `TemplatePipeline` and `SsdPipeline` name the two variants.

use anyhow::Result;
use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::compliance::{ColorPolicy, CompliancePolicy, PresencePolicy, VerdictList};
use crate::detect::{ClothingStage, DetectedItem, Detector, Label, SsdDetector, TemplateDetector};
use crate::frame::Frame;

const PERSON_COLOR: [u8; 3] = [0, 255, 0];
const CORRECT_COLOR: [u8; 3] = [255, 255, 255];
const INCORRECT_COLOR: [u8; 3] = [255, 0, 0];
const UNJUDGED_COLOR: [u8; 3] = [255, 255, 0];
const OUTLINE_PX: i32 = 2;

/// Which approved-uniform reference to show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceChoice {
    Boy,
    Girl,
}

impl ReferenceChoice {
    /// Any T-shirt item selects the boy's uniform, located or not; otherwise
    /// the girl's.
    pub fn for_items(items: &[DetectedItem]) -> Self {
        if items.iter().any(|item| item.label == Label::TShirt) {
            ReferenceChoice::Boy
        } else {
            ReferenceChoice::Girl
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            ReferenceChoice::Boy => "Boy's Uniform Detected",
            ReferenceChoice::Girl => "Girl's Uniform Detected",
        }
    }
}

/// Everything one cycle produces.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    pub verdicts: VerdictList,
    pub items: Vec<DetectedItem>,
    pub annotated: Frame,
    pub reference: ReferenceChoice,
    /// False when the detector needs a person in view and none was found.
    pub show_status: bool,
}

impl CycleReport {
    pub fn person_detected(&self) -> bool {
        self.items.iter().any(|item| item.label == Label::Person)
    }

    /// Text for the status panel.
    pub fn status_text(&self) -> String {
        let mut text = format!("{}\n\n", self.reference.heading());
        text.push_str(&self.verdicts.join("\n"));
        text.push_str("\n\nDetected Items:\n");
        for item in &self.items {
            text.push_str(&item.to_string());
            text.push('\n');
        }
        text
    }
}

/// Detector plus compliance policy.
pub struct Pipeline<D, P> {
    detector: D,
    policy: P,
}

/// Template matching judged by presence.
pub type TemplatePipeline = Pipeline<TemplateDetector, PresencePolicy>;

/// SSD person detection with clothing judged by color.
pub type SsdPipeline<M> = Pipeline<SsdDetector<M>, ColorPolicy>;

impl<D: Detector, P: CompliancePolicy> Pipeline<D, P> {
    pub fn new(detector: D, policy: P) -> Self {
        Self { detector, policy }
    }

    pub fn warm_up(&mut self) -> Result<()> {
        self.detector.warm_up()
    }

    /// Detect, judge and annotate one frame.
    pub fn run(&mut self, frame: &Frame) -> Result<CycleReport> {
        let mut items = self.detector.detect(frame)?;
        let verdicts = self.policy.evaluate(frame, &mut items);
        let show_status =
            !self.detector.requires_person() || items.iter().any(|i| i.label == Label::Person);
        let reference = ReferenceChoice::for_items(&items);
        let annotated = annotate(frame, &items);
        log::debug!(
            "{}/{}: {} item(s), verdicts {:?}",
            self.detector.name(),
            self.policy.name(),
            items.len(),
            verdicts
        );
        Ok(CycleReport {
            verdicts,
            items,
            annotated,
            reference,
            show_status,
        })
    }
}

impl TemplatePipeline {
    pub fn template(detector: TemplateDetector) -> Self {
        Pipeline::new(detector, PresencePolicy::new())
    }
}

impl<M: crate::detect::SsdModel> SsdPipeline<M> {
    pub fn ssd(model: Option<M>, clothing: ClothingStage) -> Self {
        Pipeline::new(SsdDetector::new(model, clothing), ColorPolicy::new())
    }
}

/// Copy of `frame` with item outlines drawn. Zero-size boxes are skipped.
pub fn annotate(frame: &Frame, items: &[DetectedItem]) -> Frame {
    let mut out = frame.clone();
    for item in items {
        let Some(bbox) = item.bbox.clip_to(frame.width(), frame.height()) else {
            continue;
        };
        let color = match (item.label, item.correct) {
            (Label::Person, _) => PERSON_COLOR,
            (_, Some(true)) => CORRECT_COLOR,
            (_, Some(false)) => INCORRECT_COLOR,
            (_, None) => UNJUDGED_COLOR,
        };
        for inset in 0..OUTLINE_PX {
            let w = bbox.width - 2 * inset;
            let h = bbox.height - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(bbox.x + inset, bbox.y + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(out.as_image_mut(), rect, Rgb(color));
        }
    }
    out
}
