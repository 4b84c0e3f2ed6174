//! ONNX Runtime backend for exported MedSAM encoder/decoder graphs.
//!
//! Expects two files in the model directory:
//! - `medsam_encoder.onnx`: input `image` `[1, 3, 1024, 1024]` f32, output
//!   `image_embeddings`.
//! - `medsam_decoder.onnx`: inputs `image_embeddings` and `boxes`
//!   `[1, 1, 4]` f32 (box in the 1024 input space), output `low_res_masks`
//!   `[1, 1, h, w]` f32 logits.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context};
use ndarray::{Array2, Array3, ArrayD, IxDyn};
use ort::session::Session;

use super::{Embedding, SegmentationModel};

pub const ENCODER_FILE: &str = "medsam_encoder.onnx";
pub const DECODER_FILE: &str = "medsam_decoder.onnx";

pub struct OnnxSegmenter {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
}

impl OnnxSegmenter {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let encoder_path = model_dir.join(ENCODER_FILE);
        let decoder_path = model_dir.join(DECODER_FILE);
        let encoder = Session::builder()?
            .commit_from_file(&encoder_path)
            .with_context(|| format!("loading encoder from {}", encoder_path.display()))?;
        let decoder = Session::builder()?
            .commit_from_file(&decoder_path)
            .with_context(|| format!("loading decoder from {}", decoder_path.display()))?;
        log::info!(
            "ONNX segmenter loaded from {} ({} + {})",
            model_dir.display(),
            ENCODER_FILE,
            DECODER_FILE
        );
        Ok(Self {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
        })
    }
}

impl SegmentationModel for OnnxSegmenter {
    fn encode(&self, input: &Array3<f32>) -> anyhow::Result<Embedding> {
        let (c, h, w) = input.dim();
        let shape = [1usize, c, h, w];
        let data: Vec<f32> = input.iter().copied().collect();
        let value = ort::value::Value::from_array((shape.as_slice(), data))?;

        let mut session = self
            .encoder
            .lock()
            .map_err(|_| anyhow!("encoder session lock poisoned"))?;
        let outputs = session.run(ort::inputs!["image" => value])?;
        let (out_shape, out_data) = outputs["image_embeddings"].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = out_shape.iter().map(|&d| d as usize).collect();
        let embedding = ArrayD::from_shape_vec(IxDyn(&dims), out_data.to_vec())?;
        Ok(Embedding(embedding))
    }

    fn decode(&self, embedding: &Embedding, box_input: [f32; 4]) -> anyhow::Result<Array2<f32>> {
        let emb_shape: Vec<usize> = embedding.0.shape().to_vec();
        let emb_data: Vec<f32> = embedding.0.iter().copied().collect();
        let emb_value = ort::value::Value::from_array((emb_shape.as_slice(), emb_data))?;
        let box_value =
            ort::value::Value::from_array(([1usize, 1, 4].as_slice(), box_input.to_vec()))?;

        let mut session = self
            .decoder
            .lock()
            .map_err(|_| anyhow!("decoder session lock poisoned"))?;
        let outputs = session.run(ort::inputs![
            "image_embeddings" => emb_value,
            "boxes" => box_value
        ])?;
        let (out_shape, out_data) = outputs["low_res_masks"].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = out_shape.iter().map(|&d| d as usize).collect();
        if dims.len() < 2 {
            return Err(anyhow!("decoder returned {}-d logits", dims.len()));
        }
        let (h, w) = (dims[dims.len() - 2], dims[dims.len() - 1]);
        let logits = Array2::from_shape_vec((h, w), out_data.to_vec())?;
        Ok(logits)
    }
}
