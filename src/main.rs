pub mod classify;
pub mod config;
pub mod data;
pub mod error;
pub mod html;
pub mod legend;
pub mod pipeline;
pub mod processing;
pub mod render;
pub mod server;
pub mod types;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the map bundle (decorated GeoJSON, legends, index.html)
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Build the maps and serve them over HTTP
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            info!("Generating maps with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let views = pipeline::build_map_views(&app_config).await?;
            if views.is_empty() {
                warn!("No map views were built, nothing written");
                return Ok(());
            }

            render::write_bundle(&app_config.output.dir, &views)?;
            println!("Generation complete! Open {:?}", app_config.output.dir.join("index.html"));
        }
        Commands::Serve { config } => {
            info!("Serving maps with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let views = pipeline::build_map_views(&app_config).await?;
            // The page itself is static, so refresh the bundle before serving it
            if !views.is_empty() {
                render::write_bundle(&app_config.output.dir, &views)?;
            }

            server::start_server(app_config, views).await?;
        }
    }

    Ok(())
}
