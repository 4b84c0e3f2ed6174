//! The HTTP boundary: a small actix-web app serving health, cost and job
//! endpoints over one process-wide pipeline instance.

use std::sync::Arc;
use std::time::Instant;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::heatmap::render_heatmap;
use crate::image_codec;
use crate::pipeline::{InferencePipeline, InferenceResult};
use crate::proof::{AuditTagger, ProofConfig};
use crate::response::{CostResponse, ErrorResponse, HealthResponse, JobInput, JobOutput};

pub const SERVICE_NAME: &str = "Aura MedSAM Agent";
pub const JOB_COST_ADA: u32 = 10;
pub const PAYMENT_TX_HEADER: &str = "x-masumi-payment-tx";

pub const HEALTH_PATH: &str = "/health";
pub const COST_PATH: &str = "/cost";
pub const JOB_PATH: &str = "/job";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_address: String,
    pub proof: ProofConfig,
}

pub struct ServerApp {
    config: ServerConfig,
    pipeline: InferencePipeline,
    tagger: AuditTagger,
}

impl ServerApp {
    pub fn new(config: ServerConfig, pipeline: InferencePipeline) -> Result<Self, anyhow::Error> {
        let tagger = AuditTagger::new(config.proof.clone())?;
        Ok(Self {
            config,
            pipeline,
            tagger,
        })
    }

    async fn health_handler(app: web::Data<Arc<Self>>) -> HttpResponse {
        HttpResponse::Ok().json(HealthResponse {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            ai_available: app.pipeline.has_model(),
        })
    }

    async fn cost_handler() -> HttpResponse {
        HttpResponse::Ok().json(CostResponse {
            amount: JOB_COST_ADA,
            currency: "ADA".to_string(),
        })
    }

    async fn job_handler(
        request: web::Json<JobInput>,
        http_request: HttpRequest,
        app: web::Data<Arc<Self>>,
    ) -> HttpResponse {
        if let Some(tx) = http_request
            .headers()
            .get(PAYMENT_TX_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            info!("payment verified, transaction hash {tx}");
        }
        info!("starting analysis for patient {}", request.patient_id);
        let started = Instant::now();

        let image = match image_codec::decode_data_url(&request.image_base64) {
            Ok(image) => image,
            Err(e) => {
                error!("rejecting job for {}: {e:#}", request.patient_id);
                return HttpResponse::BadRequest().json(ErrorResponse {
                    error: e.to_string(),
                });
            }
        };

        let result = app.pipeline.run_inference(&image);
        let output = match app.build_job_output(&request, &image, &result).await {
            Ok(output) => output,
            Err(e) => {
                error!(
                    "failed to assemble response for {}: {e:#}",
                    request.patient_id
                );
                return HttpResponse::InternalServerError().json(ErrorResponse {
                    error: e.to_string(),
                });
            }
        };

        debug!(
            "job for {} finished in {:?}",
            request.patient_id,
            started.elapsed()
        );
        HttpResponse::Ok().json(output)
    }

    /// Assemble the wire response: encode visuals, then stamp the audit tag.
    async fn build_job_output(
        &self,
        input: &JobInput,
        image: &image::RgbImage,
        result: &InferenceResult,
    ) -> Result<JobOutput, anyhow::Error> {
        let original_image = image_codec::rgb_to_data_url(image)?;
        let segmentation_mask = image_codec::map_to_data_url(&result.mask)?;
        let grad_cam_heatmap = image_codec::rgb_to_data_url(&render_heatmap(&result.heatmap))?;

        let midnight_proof_hash = self
            .tagger
            .tag_job(&input.patient_id, &result.diagnosis, result.confidence)
            .await;
        info!("audit tag generated: {midnight_proof_hash}");

        Ok(JobOutput {
            diagnosis: result.diagnosis.clone(),
            confidence: result.confidence,
            original_image,
            segmentation_mask,
            grad_cam_heatmap,
            shap_values: result.region_scores,
            midnight_proof_hash,
        })
    }

    pub fn get_listen_address(&self) -> &str {
        &self.config.listen_address
    }

    pub async fn run(self) -> std::io::Result<()> {
        let address = self.config.listen_address.clone();
        info!("starting {SERVICE_NAME} on {address}");

        let app = Arc::new(self);
        HttpServer::new(move || {
            let app = web::Data::new(Arc::clone(&app));
            App::new()
                .app_data(app)
                .route(HEALTH_PATH, web::get().to(Self::health_handler))
                .route(COST_PATH, web::get().to(Self::cost_handler))
                .route(JOB_PATH, web::post().to(Self::job_handler))
        })
        .bind(address)?
        .run()
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{INVASIVE_CONFIDENCE, MOCK_LABEL};
    use actix_web::{http::StatusCode, test};

    fn test_app() -> web::Data<Arc<ServerApp>> {
        let config = ServerConfig {
            listen_address: "127.0.0.1:0".to_string(),
            proof: ProofConfig::default(),
        };
        let app = ServerApp::new(config, InferencePipeline::new(None, None)).unwrap();
        web::Data::new(Arc::new(app))
    }

    macro_rules! init_test_service {
        ($data:expr) => {
            test::init_service(
                App::new()
                    .app_data($data)
                    .route(HEALTH_PATH, web::get().to(ServerApp::health_handler))
                    .route(COST_PATH, web::get().to(ServerApp::cost_handler))
                    .route(JOB_PATH, web::post().to(ServerApp::job_handler)),
            )
        };
    }

    #[actix_web::test]
    async fn health_reports_degraded_model_state() {
        let service = init_test_service!(test_app()).await;
        let response: HealthResponse = test::call_and_read_body_json(
            &service,
            test::TestRequest::get().uri(HEALTH_PATH).to_request(),
        )
        .await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.service, SERVICE_NAME);
        assert!(!response.ai_available);
    }

    #[actix_web::test]
    async fn cost_is_fixed() {
        let service = init_test_service!(test_app()).await;
        let response: CostResponse = test::call_and_read_body_json(
            &service,
            test::TestRequest::get().uri(COST_PATH).to_request(),
        )
        .await;
        assert_eq!(response.amount, JOB_COST_ADA);
        assert_eq!(response.currency, "ADA");
    }

    #[actix_web::test]
    async fn job_without_model_returns_mock_diagnosis() {
        let service = init_test_service!(test_app()).await;
        let image = image::RgbImage::new(100, 100);
        let input = JobInput {
            image_base64: image_codec::rgb_to_data_url(&image).unwrap(),
            patient_id: "patient-test".to_string(),
        };
        let request = test::TestRequest::post()
            .uri(JOB_PATH)
            .insert_header((PAYMENT_TX_HEADER, "tx-123"))
            .set_json(&input)
            .to_request();
        let output: JobOutput = test::call_and_read_body_json(&service, request).await;

        assert_eq!(output.diagnosis, MOCK_LABEL);
        assert_eq!(output.confidence, INVASIVE_CONFIDENCE);
        assert!(output
            .segmentation_mask
            .starts_with("data:image/png;base64,"));
        assert!(output
            .grad_cam_heatmap
            .starts_with("data:image/png;base64,"));
        assert!((output.shap_values.sum() - 1.0).abs() < 1e-6);
        assert_eq!(output.midnight_proof_hash.len(), 64);

        let mask = image_codec::decode_data_url(&output.segmentation_mask).unwrap();
        assert_eq!(mask.dimensions(), (100, 100));
    }

    #[actix_web::test]
    async fn malformed_image_is_a_bad_request() {
        let service = init_test_service!(test_app()).await;
        let input = JobInput {
            image_base64: "data:image/png;base64,not-an-image".to_string(),
            patient_id: "patient-bad".to_string(),
        };
        let request = test::TestRequest::post()
            .uri(JOB_PATH)
            .set_json(&input)
            .to_request();
        let response = test::call_service(&service, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
