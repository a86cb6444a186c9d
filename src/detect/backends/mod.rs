pub mod ssd;
pub mod template;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use ssd::{ClothingStage, SsdDetector, SsdModel, SsdRow};
pub use template::{ClothingTemplate, TemplateDetector};

#[cfg(feature = "backend-tract")]
pub use tract::TractSsdModel;
