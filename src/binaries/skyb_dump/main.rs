use clap::Parser;
use serde::Deserialize;
use serde::Serialize;
use skyb_show::{
    decode_rth_plan, AsyncIterator, BlockType, BlockTypeRegistry, ShowFileConfig, ShowFileReader,
};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Parser)]
#[clap(about, version, author)]
struct Config {
    #[clap(long)]
    pub path: String,

    /// JSON file with block type overrides
    #[clap(long)]
    pub config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    if config.path.is_empty() {
        println!("path MUST not be empty!");
        return Ok(());
    }

    let registry = match &config.config {
        Some(path) => ShowFileConfig::load(path).await?.registry()?,
        None => BlockTypeRegistry::shared(),
    };

    let reader = ShowFileReader::open_file_with(config.path.as_str(), registry).await?;
    println!(
        "version: {}, features: {:#04x}, checksum: {}",
        reader.version(),
        reader.features().bits(),
        reader
            .checksum()
            .map(|c| format!("{:#010x}", c))
            .unwrap_or_else(|| "-".to_string())
    );

    let mut itr = reader.blocks();
    let mut i = 0;
    while let Some(block) = itr.try_next().await? {
        println!(
            "{:04}> {} (code {}), {} bytes @{}",
            i,
            block.block_type(),
            block.code(),
            block.declared_length(),
            block.offset()
        );

        match block.block_type() {
            BlockType::Comment => {
                let body = block.read().await?;
                println!("      {}", String::from_utf8_lossy(&body));
            }
            BlockType::RthPlan => {
                let body = block.read().await?;
                let plan = decode_rth_plan(&body)?;
                println!("      scale: {}", body[0]);
                for entry in &plan {
                    println!("      {}", entry);
                }
            }
            _ => {}
        }
        i += 1;
    }

    reader.close();
    Ok(())
}
