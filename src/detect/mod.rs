mod backend;
mod backends;
mod item;

pub use backend::Detector;
pub use backends::ssd::{build_blob, decode_persons, SSD_CONFIDENCE, VOC_CLASSES};
pub use backends::template::{DOWNSAMPLE, MATCH_THRESHOLD, TEMPLATE_DIVISOR};
pub use backends::{
    ClothingStage, ClothingTemplate, SsdDetector, SsdModel, SsdRow, TemplateDetector,
};
pub use item::{DetectedItem, Label};

#[cfg(feature = "backend-tract")]
pub use backends::TractSsdModel;
