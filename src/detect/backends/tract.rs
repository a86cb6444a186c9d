#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use super::ssd::{SsdModel, SsdRow, SSD_INPUT_SIZE};

/// Tract-based runtime for an ONNX export of MobileNet-SSD.
///
/// Loads a local model file once and runs it on normalized 300×300 blobs.
pub struct TractSsdModel {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
}

impl TractSsdModel {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = SSD_INPUT_SIZE as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;
        log::info!("loaded ssd model {}", model_path.display());
        Ok(Self { model })
    }

    /// Load the model, reporting and swallowing failures.
    pub fn load_optional<P: AsRef<Path>>(model_path: P) -> Option<Self> {
        match Self::load(model_path.as_ref()) {
            Ok(model) => Some(model),
            Err(e) => {
                log::error!("{:#}", e);
                None
            }
        }
    }
}

impl SsdModel for TractSsdModel {
    fn forward(&mut self, blob: &[f32]) -> Result<Vec<SsdRow>> {
        let side = SSD_INPUT_SIZE as usize;
        let input = tract_ndarray::Array4::from_shape_vec((1, 3, side, side), blob.to_vec())
            .context("blob does not match the model input shape")?
            .into_tensor();
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let values: Vec<f32> = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .iter()
            .copied()
            .collect();
        if values.len() % 7 != 0 {
            return Err(anyhow!(
                "detection output length {} is not a multiple of 7",
                values.len()
            ));
        }
        Ok(values
            .chunks_exact(7)
            .map(|row| [row[0], row[1], row[2], row[3], row[4], row[5], row[6]])
            .collect())
    }
}
