//! Job submission client: encode an image file, send it to the agent and
//! report the outcome.

use std::path::PathBuf;

use anyhow::Context;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::image_codec;
use crate::response::{JobInput, JobOutput};
use crate::server::{JOB_PATH, PAYMENT_TX_HEADER};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server_url: Url,
    pub image_path: PathBuf,
    pub patient_id: String,
    pub payment_tx: Option<String>,
    /// When set, the raw JSON response is also written to this file.
    pub output_path: Option<PathBuf>,
}

pub struct ClientApp {
    config: ClientConfig,
}

impl ClientApp {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    fn build_job_input(&self) -> Result<JobInput, anyhow::Error> {
        debug!("reading image from {}", self.config.image_path.display());
        let image = image::open(&self.config.image_path)
            .with_context(|| format!("opening {}", self.config.image_path.display()))?
            .to_rgb8();
        Ok(JobInput {
            image_base64: image_codec::rgb_to_data_url(&image)?,
            patient_id: self.config.patient_id.clone(),
        })
    }

    fn save_output(&self, output: &JobOutput) -> Result<(), anyhow::Error> {
        if let Some(path) = &self.config.output_path {
            debug!("saving job output to {}", path.display());
            let json = serde_json::to_string_pretty(output)?;
            std::fs::write(path, json)?;
            info!("job output saved successfully");
        }
        Ok(())
    }

    pub async fn submit_job(&self) -> Result<JobOutput, anyhow::Error> {
        let input = self.build_job_input()?;
        let url = self.config.server_url.join(JOB_PATH)?;
        debug!("submitting job to {url}");

        let client = Client::new();
        let mut request = client.post(url).json(&input);
        if let Some(tx) = &self.config.payment_tx {
            request = request.header(PAYMENT_TX_HEADER, tx);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("agent rejected the job ({status}): {body}");
        }
        let output = response.json::<JobOutput>().await?;

        info!(
            "diagnosis: {} (confidence {:.3}), audit tag {}",
            output.diagnosis, output.confidence, output.midnight_proof_hash
        );
        self.save_output(&output)?;
        Ok(output)
    }

    pub fn get_server_url(&self) -> &Url {
        &self.config.server_url
    }

    pub fn get_patient_id(&self) -> &str {
        &self.config.patient_id
    }
}
