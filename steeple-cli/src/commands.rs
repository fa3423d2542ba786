//! CLI command implementations

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde_json::Value;
use steeple_core::{OutputMode, RuntimeMode, SteepleConfig};
use steeple_search::SearchService;
use steeple_web::run_server;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the JSON API server
    Serve {
        /// Host to bind to (overrides STEEPLE_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (overrides STEEPLE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// Answer from the in-memory demo directory
        #[arg(long)]
        demo: bool,
    },
    /// Run one search and print the JSON result
    Search {
        /// Request body, e.g. '{"_variant":"radius","lng":-0.12,"lat":51.5,"radius_m":2000}'
        body: String,
        /// Force GeoJSON output regardless of `_output`
        #[arg(long)]
        geojson: bool,
        /// Answer from the in-memory demo directory
        #[arg(long)]
        demo: bool,
    },
    /// Print a single church record
    Show {
        /// Church identifier
        id: String,
        /// Answer from the in-memory demo directory
        #[arg(long)]
        demo: bool,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the failure of whichever command ran
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Serve { host, port, demo } => serve(host, port, demo).await,
        Commands::Search {
            body,
            geojson,
            demo,
        } => search(&body, geojson, demo).await,
        Commands::Show { id, demo } => show(&id, demo).await,
    }
}

fn load_config(demo: bool) -> SteepleConfig {
    let mut config = SteepleConfig::from_env();
    if demo {
        config.mode = RuntimeMode::Development;
    }
    config
}

/// Start the API server
///
/// # Errors
/// - Backend client setup, bind or serve failure
pub async fn serve(host: Option<String>, port: Option<u16>, demo: bool) -> Result<()> {
    let mut config = load_config(demo);
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    run_server(config)
        .await
        .map_err(|e| anyhow::anyhow!("server failed: {e}"))
}

/// Run a single search
///
/// # Errors
/// - Body is not a JSON object, the query is invalid, or the backend failed
pub async fn search(body: &str, geojson: bool, demo: bool) -> Result<()> {
    let payload = match serde_json::from_str::<Value>(body).context("body is not valid JSON")? {
        Value::Object(map) => map,
        _ => bail!("body must be a JSON object"),
    };

    let service = SearchService::from_config(&load_config(demo))?;
    let forced_output = geojson.then_some(OutputMode::GeoJson);
    let results = service.search_payload(&payload, forced_output).await?;

    tracing::debug!(count = results.len(), "Search finished");
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

/// Show one church
///
/// # Errors
/// - The church does not exist or the backend failed
pub async fn show(id: &str, demo: bool) -> Result<()> {
    let service = SearchService::from_config(&load_config(demo))?;
    let record = service.church(id).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
