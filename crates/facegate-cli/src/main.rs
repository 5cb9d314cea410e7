use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};

use facegate_core::CascadeLocalizer;
use facegate_engine::{
    Config, EnrollResponse, FaceAuthEngine, FileRegistry, StatusResponse, TemplateRegistry,
    VerifyResponse,
};

#[derive(Parser)]
#[command(name = "facegate", about = "Facegate face authentication CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a face from an image file
    Enroll {
        /// Stable identifier for the person (e.g., a phone number)
        #[arg(short, long)]
        identifier: String,
        /// Human-readable display label
        #[arg(short, long)]
        label: String,
        /// Image file containing the face
        image: PathBuf,
    },
    /// Verify an image file against all enrolled faces
    Verify {
        /// Image file containing the face
        image: PathBuf,
    },
    /// List enrolled templates
    List,
    /// Show engine liveness status
    Status,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        model_path = %config.model_path.display(),
        threshold = config.match_threshold,
        "configuration loaded"
    );

    match cli.command {
        Commands::Enroll {
            identifier,
            label,
            image,
        } => {
            let engine = build_engine(&config)?;
            let payload = read_payload(&image)?;
            let result = engine.enroll(&identifier, &label, &payload);
            let failed = result.is_err();
            print_json(&EnrollResponse::from_result(&result))?;
            Ok(exit_code(failed))
        }
        Commands::Verify { image } => {
            let engine = build_engine(&config)?;
            let payload = read_payload(&image)?;
            let result = engine.verify(&payload);
            let failed = result.is_err();
            print_json(&VerifyResponse::from_result(&result))?;
            Ok(exit_code(failed))
        }
        Commands::List => {
            let registry = FileRegistry::open(config.registry_dir())?;
            let templates = registry.list_all()?;
            if templates.is_empty() {
                println!("No templates enrolled");
            } else {
                for t in templates {
                    println!("{}\t{}\t{}", t.identifier, t.display_label, t.enrolled_at);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            let engine = build_engine(&config)?;
            let status = engine.status();
            print_json(&StatusResponse::from_status(&status))?;
            Ok(exit_code(!status.operational()))
        }
    }
}

fn build_engine(config: &Config) -> Result<FaceAuthEngine<CascadeLocalizer, FileRegistry>> {
    let model_path = config.model_path.to_string_lossy();
    let localizer = CascadeLocalizer::load(&model_path)
        .with_context(|| format!("loading cascade model from {model_path}"))?;
    let registry = FileRegistry::open(config.registry_dir())?;
    Ok(FaceAuthEngine::new(
        localizer,
        registry,
        config.match_threshold,
    ))
}

fn read_payload(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
    Ok(STANDARD.encode(bytes))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
