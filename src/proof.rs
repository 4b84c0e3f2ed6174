//! Privacy audit tags.
//!
//! Each job is stamped with a SHA-256 tag over the job's public outcome. The
//! tag is an opaque audit identifier, not a cryptographic proof: the actual
//! proof system lives in an external prover process which this module only
//! pings for liveness. Prover absence is logged and never fatal.

use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

pub const DEFAULT_PROVER_URL: &str = "http://127.0.0.1:6300";
pub const DEFAULT_ARTIFACT_PATH: &str = "build/contract/index.cjs";
pub const PROOF_SALT: &str = "MIDNIGHT-SALT";

const PROVER_PING_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofConfig {
    pub prover_url: Url,
    pub artifact_path: PathBuf,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            prover_url: Url::parse(DEFAULT_PROVER_URL).expect("default prover URL is valid"),
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
        }
    }
}

pub struct AuditTagger {
    config: ProofConfig,
    http: reqwest::Client,
}

impl AuditTagger {
    pub fn new(config: ProofConfig) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(PROVER_PING_TIMEOUT)
            .build()?;
        Ok(Self { config, http })
    }

    /// The hashed payload: `{patient_id}-{diagnosis}-{confidence}-{salt}`.
    /// Confidence uses plain decimal formatting so tags stay stable for the
    /// fixed confidence constants.
    pub fn payload(patient_id: &str, diagnosis: &str, confidence: f64) -> String {
        format!("{patient_id}-{diagnosis}-{confidence}-{PROOF_SALT}")
    }

    /// SHA-256 hex digest of the job payload.
    pub fn hash_payload(patient_id: &str, diagnosis: &str, confidence: f64) -> String {
        let payload = Self::payload(patient_id, diagnosis, confidence);
        hex::encode(Sha256::digest(payload.as_bytes()))
    }

    /// Produce the audit tag for one finished job: log contract artifact
    /// status, ping the prover, hash the payload.
    pub async fn tag_job(&self, patient_id: &str, diagnosis: &str, confidence: f64) -> String {
        match std::fs::metadata(&self.config.artifact_path) {
            Ok(meta) => info!(
                "contract artifact loaded: {} ({} bytes)",
                self.config.artifact_path.display(),
                meta.len()
            ),
            Err(_) => warn!(
                "contract artifact not found at {}, running in simulation mode",
                self.config.artifact_path.display()
            ),
        }

        match self.http.get(self.config.prover_url.clone()).send().await {
            Ok(_) => info!("proof server handshake succeeded ({})", self.config.prover_url),
            Err(e) => warn!("proof server unreachable ({}): {e}", self.config.prover_url),
        }

        Self::hash_payload(patient_id, diagnosis, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_format_is_stable() {
        let payload = AuditTagger::payload("patient-7", "Suspicious Mass Detected", 0.823);
        assert_eq!(
            payload,
            "patient-7-Suspicious Mass Detected-0.823-MIDNIGHT-SALT"
        );
    }

    #[test]
    fn hash_is_deterministic_hex() {
        let a = AuditTagger::hash_payload("p1", "No Significant Abnormality", 0.712);
        let b = AuditTagger::hash_payload("p1", "No Significant Abnormality", 0.712);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_binds_all_inputs() {
        let base = AuditTagger::hash_payload("p1", "Invasive Ductal Carcinoma", 0.958);
        assert_ne!(
            base,
            AuditTagger::hash_payload("p2", "Invasive Ductal Carcinoma", 0.958)
        );
        assert_ne!(
            base,
            AuditTagger::hash_payload("p1", "Suspicious Mass Detected", 0.958)
        );
        assert_ne!(
            base,
            AuditTagger::hash_payload("p1", "Invasive Ductal Carcinoma", 0.823)
        );
    }
}
