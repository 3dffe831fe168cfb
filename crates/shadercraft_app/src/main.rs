// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shadercraft command line entry point.
//!
//! Builds the demo material graph and writes its generated GLSL sources.
//!
//! ```text
//! shadercraft [CONFIG]
//! shadercraft --init-config [PATH]
//! ```

use shadercraft_graph::config::CONFIG_FILE_NAME;
use shadercraft_graph::{
    ConfigError, GenerateError, GeneratorConfig, GraphError, NodeGraph, ShaderGenerator,
};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "shadercraft=debug";

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

enum Command {
    Generate { config: Option<PathBuf> },
    InitConfig { path: PathBuf },
}

impl Command {
    fn from_args(mut args: impl Iterator<Item = String>) -> Self {
        match args.next() {
            Some(flag) if flag == "--init-config" => Self::InitConfig {
                path: args.next().map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), PathBuf::from),
            },
            other => Self::Generate {
                config: other.map(PathBuf::from),
            },
        }
    }
}

fn main() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Shadercraft v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(Command::from_args(std::env::args().skip(1))) {
        tracing::error!("Shadercraft failed: {e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::InitConfig { path } => {
            GeneratorConfig::default().save(&path)?;
            tracing::info!("Wrote default config to {:?}", path);
        }
        Command::Generate { config } => {
            let config = match config {
                Some(path) => GeneratorConfig::load(&path)?,
                None => GeneratorConfig::default(),
            };
            generate(&config)?;
        }
    }
    Ok(())
}

fn generate(config: &GeneratorConfig) -> Result<(), AppError> {
    let graph = NodeGraph::demo()?;
    tracing::info!(
        "Loaded graph '{}' with {} nodes and {} connections",
        graph.name,
        graph.node_count(),
        graph.connection_count()
    );

    let generator = ShaderGenerator::from_config(config)?;
    let source = generator.generate(&graph)?;
    let files = source.write_to(&config.output_dir, config)?;

    tracing::info!("Vertex shader: {}", files.vertex.display());
    tracing::info!("Fragment shader: {}", files.fragment.display());
    Ok(())
}
