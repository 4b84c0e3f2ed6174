//! # aura-agent
//!
//! A small HTTP agent that wraps a pretrained medical-image segmentation model,
//! turns its raw probability output into a categorical diagnosis with a
//! region-importance breakdown, and stamps every job with a SHA-256 audit tag
//! obtained from an (optional) external prover process.
//!
//! The heart of the crate is the tiered inference pipeline. Per request it walks
//! down a fixed demotion chain and always terminates in a complete result:
//!
//! ```text
//! no model            -> degraded mode (synthetic blobs)
//! model + explainer   -> explainability report
//!   explainer fails   -> SAM-only segmentation
//!     model fails     -> degraded mode
//! ```
//!
//! Tier failures are logged and demoted, never surfaced to the caller; the HTTP
//! boundary always receives a well-typed `JobOutput`.
//!
//! ## Running the server
//!
//! ```text
//! aura-agent serve --address 0.0.0.0:8000
//! ```
//!
//! Endpoints:
//! - `GET /health` - service liveness and whether a real model is loaded
//! - `GET /cost` - fixed job cost
//! - `POST /job` - run one analysis; body `{ "image_base64": ..., "patient_id": ... }`
//!
//! ## Using the pipeline as a library
//!
//! ```no_run
//! use aura_agent::pipeline::InferencePipeline;
//!
//! let pipeline = InferencePipeline::new(None, None); // no model: degraded mode
//! let image = image::RgbImage::new(256, 256);
//! let result = pipeline.run_inference(&image);
//! println!("{} ({:.1}%)", result.diagnosis, result.confidence * 100.0);
//! ```
//!
//! Collaborators are injected: implement [`model::SegmentationModel`] (and
//! optionally [`model::Explainer`]) and hand them to the pipeline. The
//! non-default `onnx` cargo feature provides an `ort`-backed segmenter for
//! exported encoder/decoder graphs.

pub mod classify;
pub mod client;
pub mod degraded;
pub mod geometry;
pub mod heatmap;
pub mod image_codec;
pub mod mask;
pub mod model;
pub mod pipeline;
pub mod proof;
pub mod regions;
pub mod response;
pub mod server;
