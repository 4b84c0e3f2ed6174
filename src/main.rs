use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use url::Url;

use aura_agent::client::{ClientApp, ClientConfig};
use aura_agent::model::SegmentationModel;
use aura_agent::pipeline::InferencePipeline;
use aura_agent::proof::{ProofConfig, DEFAULT_ARTIFACT_PATH, DEFAULT_PROVER_URL};
use aura_agent::server::{ServerApp, ServerConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis agent.
    Serve {
        #[arg(short, long, default_value = "0.0.0.0:8000")]
        address: String,
        /// Directory holding exported model graphs. Without it (or without the
        /// `onnx` feature) the agent serves degraded-mode output.
        #[arg(short, long)]
        model_dir: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_PROVER_URL)]
        prover_url: String,
        #[arg(long, default_value = DEFAULT_ARTIFACT_PATH)]
        artifact_path: PathBuf,
    },
    /// Submit one image to a running agent.
    Analyze {
        #[arg(short, long, default_value = "http://127.0.0.1:8000")]
        server_url: String,
        #[arg(short, long)]
        image: PathBuf,
        #[arg(short, long, default_value = "patient-1")]
        patient_id: String,
        #[arg(long)]
        payment_tx: Option<String>,
        /// Save the raw JSON response here.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging() {
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Info);

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    info!("logging initialized with level {log_level}");
}

fn load_model(model_dir: Option<PathBuf>) -> Option<Arc<dyn SegmentationModel>> {
    let dir = model_dir?;
    load_backend(&dir)
}

#[cfg(feature = "onnx")]
fn load_backend(dir: &std::path::Path) -> Option<Arc<dyn SegmentationModel>> {
    match aura_agent::model::onnx::OnnxSegmenter::load(dir) {
        Ok(model) => Some(Arc::new(model) as Arc<dyn SegmentationModel>),
        Err(e) => {
            warn!(
                "failed to load model from {}: {e:#}; running in degraded mode",
                dir.display()
            );
            None
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn load_backend(dir: &std::path::Path) -> Option<Arc<dyn SegmentationModel>> {
    warn!(
        "model directory {} ignored: built without the `onnx` feature, running in degraded mode",
        dir.display()
    );
    None
}

async fn run_server(
    address: String,
    model_dir: Option<PathBuf>,
    prover_url: String,
    artifact_path: PathBuf,
) -> Result<(), anyhow::Error> {
    let model = load_model(model_dir);
    if model.is_none() {
        warn!("no segmentation model loaded, responses will be synthetic");
    }
    let pipeline = InferencePipeline::new(model, None);

    let config = ServerConfig {
        listen_address: address,
        proof: ProofConfig {
            prover_url: Url::parse(&prover_url)?,
            artifact_path,
        },
    };
    ServerApp::new(config, pipeline)?.run().await?;
    Ok(())
}

async fn run_client(
    server_url: String,
    image: PathBuf,
    patient_id: String,
    payment_tx: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    let config = ClientConfig {
        server_url: Url::parse(&server_url)?,
        image_path: image,
        patient_id,
        payment_tx,
        output_path: output,
    };
    let client = ClientApp::new(config);
    let result = client.submit_job().await?;

    info!("diagnosis: {}", result.diagnosis);
    info!("confidence: {:.3}", result.confidence);
    info!("audit tag: {}", result.midnight_proof_hash);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            address,
            model_dir,
            prover_url,
            artifact_path,
        } => run_server(address, model_dir, prover_url, artifact_path).await,
        Commands::Analyze {
            server_url,
            image,
            patient_id,
            payment_tx,
            output,
        } => run_client(server_url, image, patient_id, payment_tx, output).await,
    }
}
