//! Reclaim CLI - plastic valuation web service

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use reclaim_cli::api::{self, AppState};
use reclaim_cli::config::Config;
use reclaim_cli::diagnostics::StartupReport;
use reclaim_cli::{init_logging, predict_json};
use reclaim_model::{ModelBundle, Predictor};

#[derive(Parser)]
#[command(name = "reclaim")]
#[command(author = "Reclaim Contributors")]
#[command(version)]
#[command(about = "Reclaim - plastic item valuation service", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, global = true, env = "RECLAIM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the pages and the prediction API
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Bind address
        #[arg(long)]
        bind: Option<String>,

        /// Directory holding the model artifacts
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Directory holding the page templates
        #[arg(long)]
        templates_dir: Option<PathBuf>,

        /// Directory served under /static/
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Answer 404 for unmatched paths instead of serving the home page
        #[arg(long)]
        no_home_fallback: bool,
    },

    /// Report artifact and template inventory and try loading the models
    Check {
        /// Directory holding the model artifacts
        #[arg(long)]
        models_dir: Option<PathBuf>,
    },

    /// Score one item and print the response JSON
    Predict {
        /// Directory holding the model artifacts
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Path to a JSON file with the item
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Inline JSON item
        #[arg(short, long)]
        json: Option<String>,
    },

    /// Generate an example configuration file
    ConfigGen {
        /// Output format (yaml or toml)
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load(path).map_err(|e| anyhow::anyhow!("{}", e))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Serve {
            port,
            bind,
            models_dir,
            templates_dir,
            static_dir,
            no_home_fallback,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(dir) = models_dir {
                config.models.dir = dir;
            }
            if let Some(dir) = templates_dir {
                config.pages.templates_dir = dir;
            }
            if let Some(dir) = static_dir {
                config.pages.static_dir = dir;
            }
            if no_home_fallback {
                config.pages.fallback_to_home = false;
            }

            init_logging(&config.logging)?;
            run_server(config).await?;
        }

        Commands::Check { models_dir } => {
            if let Some(dir) = models_dir {
                config.models.dir = dir;
            }
            init_logging(&config.logging)?;

            println!("{}", StartupReport::collect(&config));
            match ModelBundle::try_load(&config.models.dir) {
                Ok(_) => println!("Models loaded."),
                Err(e) => anyhow::bail!("Models NOT loaded: {}", e),
            }
        }

        Commands::Predict {
            models_dir,
            file,
            json,
        } => {
            if let Some(dir) = models_dir {
                config.models.dir = dir;
            }
            init_logging(&config.logging)?;

            let source = match (file, json) {
                (Some(path), None) => std::fs::read_to_string(path)?,
                (None, Some(json)) => json,
                (Some(_), Some(_)) => anyhow::bail!("--file and --json are mutually exclusive"),
                (None, None) => anyhow::bail!("Either --file or --json must be provided"),
            };

            let predictor = Predictor::new(Arc::new(ModelBundle::load(&config.models.dir)));
            let response = predict_json(&predictor, &source)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::ConfigGen { format, output } => {
            let content = match format.to_lowercase().as_str() {
                "yaml" | "yml" => Config::example_yaml(),
                "toml" => Config::example_toml(),
                _ => anyhow::bail!("Unsupported format: {}. Use 'yaml' or 'toml'", format),
            };

            if let Some(path) = output {
                std::fs::write(&path, &content)?;
                println!("Configuration written to: {}", path.display());
            } else {
                println!("{}", content);
            }
        }
    }

    Ok(())
}

// =============================================================================
// Server Mode
// =============================================================================

async fn run_server(config: Config) -> Result<()> {
    let bind = config.server.bind.clone();
    let port = config.server.port;

    // Parse bind address
    let bind_addr: std::net::IpAddr = bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", bind, e))?;

    println!("{}", StartupReport::collect(&config));
    println!();

    let bundle = Arc::new(ModelBundle::load(&config.models.dir));

    println!("Reclaim Server");
    println!("==================");
    println!("Pages:     http://{}:{}/", bind, port);
    println!("Predict:   http://{}:{}/predict", bind, port);
    println!(
        "Models:    {}",
        if bundle.is_loaded() {
            "loaded"
        } else {
            "not loaded (fallback scoring)"
        }
    );
    println!(
        "Catch-all: {}",
        if config.pages.fallback_to_home {
            "serves home page"
        } else {
            "404"
        }
    );
    println!();

    let state = Arc::new(AppState::new(&config, bundle));
    let routes = api::app_routes(state);

    info!("Server listening on {}:{}", bind, port);
    warp::serve(routes).run((bind_addr, port)).await;

    Ok(())
}
