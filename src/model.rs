//! Collaborator traits for the segmentation model and the optional
//! explainability module. Both are injected into the pipeline, loaded once at
//! process start and treated as read-only for the lifetime of the process.

use image::RgbImage;
use ndarray::{Array2, Array3, ArrayD};

use crate::geometry::BoxPrompt;
use crate::regions::RegionScores;

#[cfg(feature = "onnx")]
pub mod onnx;

/// Opaque image embedding produced by the model's encoder.
#[derive(Debug, Clone)]
pub struct Embedding(pub ArrayD<f32>);

/// A promptable segmentation model: encode an image tensor once, then decode
/// low-resolution mask logits for a box prompt. Inference is read-only.
pub trait SegmentationModel: Send + Sync {
    fn encode(&self, input: &Array3<f32>) -> anyhow::Result<Embedding>;

    /// Decode mask logits for a box prompt given in the model's 1024x1024
    /// input space (see [`crate::geometry::BoxPrompt::scale_to_input`]).
    fn decode(&self, embedding: &Embedding, box_input: [f32; 4]) -> anyhow::Result<Array2<f32>>;
}

/// Everything a richer explainability collaborator can hand back for one image.
#[derive(Debug, Clone)]
pub struct ExplanationReport {
    pub mask: Array2<f32>,
    pub prob_map: Array2<f32>,
    /// Gradient-based attention map; preferred over `prob_map` as the heatmap
    /// when present.
    pub gradient_map: Option<Array2<f32>>,
    pub region_importance: Option<RegionScores>,
}

/// Optional explainability collaborator. Absence or failure is tolerated by
/// the pipeline, which demotes to plain segmentation.
pub trait Explainer: Send + Sync {
    fn generate_report(
        &self,
        image: &RgbImage,
        box_prompt: &BoxPrompt,
        confidence: f64,
    ) -> anyhow::Result<ExplanationReport>;
}
