//! Static image assets: approved-uniform references and clothing templates.
//!
//! Assets are read once at startup. A file that is missing or unreadable is
//! logged and becomes `None`; startup continues without it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::detect::{ClothingTemplate, Label};
use crate::pipeline::ReferenceChoice;

/// Display size of the reference images.
pub const REFERENCE_WIDTH: u32 = 200;
pub const REFERENCE_HEIGHT: u32 = 300;

/// Locations of every asset the pipeline may use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
    pub boy_reference: PathBuf,
    pub girl_reference: PathBuf,
    pub tshirt_template: PathBuf,
    pub pants_template: PathBuf,
    pub shoes_template: PathBuf,
    pub ssd_model: PathBuf,
}

impl AssetPaths {
    /// Conventional file names under one directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            boy_reference: dir.join("boy.jpg"),
            girl_reference: dir.join("girl.jpg"),
            tshirt_template: dir.join("tshirt.jpg"),
            pants_template: dir.join("pants.jpg"),
            shoes_template: dir.join("shoes.jpg"),
            ssd_model: dir.join("mobilenet_ssd.onnx"),
        }
    }

    fn template_path(&self, label: Label) -> Option<&Path> {
        match label {
            Label::TShirt => Some(self.tshirt_template.as_path()),
            Label::Pants => Some(self.pants_template.as_path()),
            Label::Shoes => Some(self.shoes_template.as_path()),
            Label::Person => None,
        }
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::in_dir("uniform")
    }
}

/// Decode an image file as RGB.
pub fn read_image(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).with_context(|| format!("open image {}", path.display()))?;
    Ok(image.into_rgb8())
}

/// Decode an image file, logging and swallowing failures.
pub fn load_image(path: &Path) -> Option<RgbImage> {
    match read_image(path) {
        Ok(image) => Some(image),
        Err(e) => {
            log::error!("asset unavailable: {:#}", e);
            None
        }
    }
}

/// The two approved-uniform images, resized for display.
#[derive(Clone, Debug, Default)]
pub struct ReferenceImages {
    boy: Option<RgbImage>,
    girl: Option<RgbImage>,
}

impl ReferenceImages {
    pub fn new(boy: Option<RgbImage>, girl: Option<RgbImage>) -> Self {
        Self { boy, girl }
    }

    pub fn load(paths: &AssetPaths) -> Self {
        let fit = |image: RgbImage| {
            imageops::resize(&image, REFERENCE_WIDTH, REFERENCE_HEIGHT, FilterType::Triangle)
        };
        Self {
            boy: load_image(&paths.boy_reference).map(fit),
            girl: load_image(&paths.girl_reference).map(fit),
        }
    }

    pub fn get(&self, choice: ReferenceChoice) -> Option<&RgbImage> {
        match choice {
            ReferenceChoice::Boy => self.boy.as_ref(),
            ReferenceChoice::Girl => self.girl.as_ref(),
        }
    }
}

/// Clothing templates in T-shirt, pants, shoes order. Missing files are skipped.
pub fn load_templates(paths: &AssetPaths) -> Vec<ClothingTemplate> {
    Label::CLOTHING
        .iter()
        .filter_map(|&label| {
            let path = paths.template_path(label)?;
            load_image(path).map(|image| ClothingTemplate::new(label, image))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_assets_degrade_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AssetPaths::in_dir(dir.path());
        let refs = ReferenceImages::load(&paths);
        assert!(refs.get(ReferenceChoice::Boy).is_none());
        assert!(refs.get(ReferenceChoice::Girl).is_none());
        assert!(load_templates(&paths).is_empty());
    }

    #[test]
    fn references_are_resized_and_templates_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AssetPaths::in_dir(dir.path());
        let swatch = RgbImage::from_pixel(20, 10, image::Rgb([1, 2, 3]));
        swatch.save(&paths.girl_reference).unwrap();
        swatch.save(&paths.shoes_template).unwrap();
        swatch.save(&paths.tshirt_template).unwrap();

        let refs = ReferenceImages::load(&paths);
        let girl = refs.get(ReferenceChoice::Girl).unwrap();
        assert_eq!(girl.dimensions(), (REFERENCE_WIDTH, REFERENCE_HEIGHT));
        assert!(refs.get(ReferenceChoice::Boy).is_none());

        let labels: Vec<Label> = load_templates(&paths).iter().map(|t| t.label).collect();
        assert_eq!(labels, vec![Label::TShirt, Label::Shoes]);
    }
}
