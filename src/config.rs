use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::classifier::LoadOptions;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Path to the ONNX export of the nail classifier.
    #[arg(long = "model", env = "NAIL_MODEL_PATH", default_value = "models/nail_vgg16.onnx")]
    pub path: PathBuf,

    /// Intra-op threads used by ONNX Runtime, all cores when unset.
    #[arg(long, env = "NAIL_INTRA_THREADS")]
    pub intra_threads: Option<usize>,
}

impl ModelArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            intra_threads: self.intra_threads,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the upload page and prediction API (default).
    Serve(ServeArgs),
    /// Classify image files and print the results.
    Predict(PredictArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "NAIL_LISTEN_ADDR", default_value = "127.0.0.1:8501")]
    pub listen: SocketAddr,

    /// Largest accepted upload, in MiB.
    #[arg(long, env = "NAIL_MAX_UPLOAD_MIB", default_value_t = 10)]
    pub max_upload_mib: usize,

    /// Example nail photo shown in the sidebar.
    #[arg(long, env = "NAIL_SAMPLE_IMAGE")]
    pub sample_image: Option<PathBuf>,
}

impl ServeArgs {
    /// Settings for a bare invocation without the `serve` subcommand, read
    /// from the same `NAIL_*` variables and validated the same way.
    pub fn from_env() -> Result<Self, clap::Error> {
        ServeEnv::try_parse_from([env!("CARGO_PKG_NAME")]).map(|env| env.serve)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mib.saturating_mul(1024 * 1024)
    }
}

#[derive(Parser, Debug)]
struct ServeEnv {
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// JPEG or PNG files to classify.
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Print one JSON object per image instead of text.
    #[arg(long)]
    pub json: bool,
}
