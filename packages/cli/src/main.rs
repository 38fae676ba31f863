#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal shell for the safe-drive toolkit.
//!
//! Provides a unified entry point (`cargo safe-drive`) for the live hazard
//! dashboard, the hazard list, ad-hoc distance and briefing lookups, and
//! the road-safety consultant chat. Run without a subcommand for an
//! interactive menu.

mod dashboard;
mod hazards;
mod interactive;
mod setup;
mod watch;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use safe_drive_ai::insight::InsightService as _;
use safe_drive_chat::{ChatSession, format_transcript};
use safe_drive_hazard::HazardCatalog;
use safe_drive_hazard_models::{GeoPoint, RiskLevel};

use crate::watch::{LocationSource, WatchOptions};

/// Delay between replayed track points.
const DEFAULT_INTERVAL_MS: u64 = 1000;

#[derive(Parser)]
#[command(name = "safe_drive", about = "Road hazard alerts and safety chat for Nigerian drivers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor a recorded track or a fixed position for nearby hazards
    Watch {
        /// CSV track with columns `latitude,longitude,speed_mps,heading,accuracy`
        #[arg(long, conflicts_with_all = ["lat", "lng"])]
        track: Option<PathBuf>,
        /// Latitude of a fixed position
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude of a fixed position
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Milliseconds between replayed track points
        #[arg(long, default_value_t = DEFAULT_INTERVAL_MS)]
        interval_ms: u64,
        /// Alert radius in km (overrides `ALERT_THRESHOLD_KM`)
        #[arg(long)]
        threshold_km: Option<f64>,
        /// Hazard catalog file (overrides `HAZARD_CATALOG_PATH`)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Skip insight requests for hazards whose first request is still running
        #[arg(long)]
        dedupe: bool,
    },
    /// List hazard segments
    Hazards {
        /// Only show segments with this risk level (`High`, `Medium`, `Low`)
        #[arg(long)]
        risk: Option<RiskLevel>,
        /// Hazard catalog file (overrides `HAZARD_CATALOG_PATH`)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Show one hazard segment in full
    Hazard {
        /// Segment identifier (e.g., "lag-ib-1")
        id: String,
        /// Hazard catalog file (overrides `HAZARD_CATALOG_PATH`)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Distance from a position to every hazard segment
    Distance {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Alert radius in km (overrides `ALERT_THRESHOLD_KM`)
        #[arg(long)]
        threshold_km: Option<f64>,
        /// Hazard catalog file (overrides `HAZARD_CATALOG_PATH`)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Ask the AI for a safety briefing on one segment
    Insight {
        /// Segment identifier (e.g., "lag-ib-1")
        id: String,
        /// Hazard catalog file (overrides `HAZARD_CATALOG_PATH`)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Chat with the road-safety consultant
    Chat {
        /// Send a single message and print the exchange instead of
        /// starting an interactive session
        #[arg(long)]
        message: Option<String>,
    },
}

/// Prints the AI briefing for `id`, or the reason it is unavailable.
async fn print_insight(catalog: &HazardCatalog, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let segment = catalog
        .get(id)
        .ok_or_else(|| format!("No hazard segment with ID: {id}"))?;

    println!("{}", hazards::render_detail(segment));
    println!();

    let services = setup::AiServices::from_env();
    match services.insight.request_insight(segment).await {
        Ok(text) => println!("AI Safety Insight: {text}"),
        Err(e) => println!("AI Safety Insight unavailable: {e}"),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run().await;
    };

    match command {
        Commands::Watch {
            track,
            lat,
            lng,
            interval_ms,
            threshold_km,
            catalog,
            dedupe,
        } => {
            let source = match (track, lat, lng) {
                (Some(path), _, _) => LocationSource::Track(path),
                (None, Some(lat), Some(lng)) => LocationSource::Position(GeoPoint::new(lat, lng)),
                _ => return Err("Provide either --track or --lat and --lng".into()),
            };
            let options = WatchOptions {
                source,
                interval: Duration::from_millis(interval_ms),
                threshold_km,
                catalog,
                dedupe,
            };
            watch::run(&options).await?;
        }
        Commands::Hazards { risk, catalog } => {
            let catalog = setup::load_catalog(catalog.as_deref())?;
            println!("{}", hazards::render_list(&catalog, risk));
        }
        Commands::Hazard { id, catalog } => {
            let catalog = setup::load_catalog(catalog.as_deref())?;
            let segment = catalog
                .get(&id)
                .ok_or_else(|| format!("No hazard segment with ID: {id}"))?;
            println!("{}", hazards::render_detail(segment));
        }
        Commands::Distance {
            lat,
            lng,
            threshold_km,
            catalog,
        } => {
            let catalog = setup::load_catalog(catalog.as_deref())?;
            let config = setup::alert_config(threshold_km, false)?;
            println!(
                "{}",
                hazards::render_distances(&catalog, GeoPoint::new(lat, lng), &config)
            );
        }
        Commands::Insight { id, catalog } => {
            let catalog = setup::load_catalog(catalog.as_deref())?;
            print_insight(&catalog, &id).await?;
        }
        Commands::Chat { message } => {
            let services = setup::AiServices::from_env();
            if let Some(message) = message {
                let mut session = ChatSession::new();
                session.send_message(services.chat.as_ref(), &message).await?;
                print!("{}", format_transcript(session.transcript()));
            } else {
                safe_drive_chat::interactive::run(services.chat.as_ref()).await?;
            }
        }
    }

    Ok(())
}
