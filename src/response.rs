//! Wire types for the HTTP boundary. Field names are kept in the shape the
//! existing dashboard frontend consumes.

use serde::{Deserialize, Serialize};

use crate::regions::RegionScores;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInput {
    pub image_base64: String,
    pub patient_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutput {
    pub diagnosis: String,
    pub confidence: f64,
    pub original_image: String,
    pub segmentation_mask: String,
    pub grad_cam_heatmap: String,
    pub shap_values: RegionScores,
    pub midnight_proof_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub ai_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostResponse {
    pub amount: u32,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
