use clap::Parser;
use serde::Deserialize;
use serde::Serialize;
use skyb_show::{RthPlan, ShowFileConfig, ShowFileWriter};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Parser)]
#[clap(about, author)]
struct Config {
    /// RTH plan in JSON
    #[clap(long)]
    pub path: String,

    #[clap(long)]
    pub output: String,

    /// scaling factor; the smallest one that fits is used if omitted
    #[clap(long)]
    pub scale: Option<u8>,

    #[clap(long)]
    pub comment: Option<String>,

    /// show file format version
    #[clap(long)]
    pub version: Option<u8>,

    #[clap(long)]
    pub config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    if config.path.is_empty() || config.output.is_empty() {
        println!("path and output MUST not be empty!");
        return Ok(());
    }

    let mut file_config = match &config.config {
        Some(path) => ShowFileConfig::load(path).await?,
        None => ShowFileConfig::default(),
    };
    if config.version.is_some() {
        file_config.version = config.version;
    }
    let options = file_config.into_options()?;

    let plan: RthPlan = serde_json::from_slice(&tokio::fs::read(&config.path).await?)?;
    let scale = match config.scale {
        Some(scale) => scale,
        None => plan.propose_scaling_factor()?,
    };

    let mut writer = ShowFileWriter::create_file(config.output.as_str(), options).await?;
    if let Some(comment) = &config.comment {
        writer.add_comment(comment).await?;
    }
    writer.add_rth_plan_with_scale(&plan, scale).await?;
    writer.finalize().await?;

    let size = writer.get_bytes()?.len();
    writer.close().await?;

    tracing::info!(entries = plan.len(), scale, size, "wrote {}", config.output);
    println!("scale: {}, size: {} bytes", scale, size);

    Ok(())
}
