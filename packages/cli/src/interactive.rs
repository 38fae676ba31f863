//! Menu-driven mode used when no subcommand is given.

use std::path::PathBuf;
use std::time::Duration;

use dialoguer::{Input, Select};
use safe_drive_alerts::AlertConfig;
use safe_drive_hazard::HazardCatalog;
use safe_drive_hazard_models::GeoPoint;

use crate::watch::{LocationSource, WatchOptions};
use crate::{DEFAULT_INTERVAL_MS, hazards, setup, watch};

/// Top-level tool selection.
enum Tool {
    Watch,
    Hazards,
    Distances,
    Insight,
    Chat,
}

impl Tool {
    const ALL: &[Self] = &[
        Self::Watch,
        Self::Hazards,
        Self::Distances,
        Self::Insight,
        Self::Chat,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Watch => "Drive: monitor a position or recorded track",
            Self::Hazards => "List hazard segments",
            Self::Distances => "Distances from a position",
            Self::Insight => "Safety briefing for a segment",
            Self::Chat => "Ask the road safety consultant",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt or the selected tool fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("NaijaSafeDrive");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Watch => handle_watch().await?,
        Tool::Hazards => {
            let catalog = setup::load_catalog(None)?;
            println!("{}", hazards::render_list(&catalog, None));
        }
        Tool::Distances => {
            let catalog = setup::load_catalog(None)?;
            let point = prompt_position()?;
            let config = setup::alert_config(None, false)?;
            println!("{}", hazards::render_distances(&catalog, point, &config));
        }
        Tool::Insight => {
            let catalog = setup::load_catalog(None)?;
            let id = pick_segment(&catalog)?;
            crate::print_insight(&catalog, &id).await?;
        }
        Tool::Chat => {
            let services = setup::AiServices::from_env();
            safe_drive_chat::interactive::run(services.chat.as_ref()).await?;
        }
    }

    Ok(())
}

async fn handle_watch() -> Result<(), Box<dyn std::error::Error>> {
    let sources = ["Fixed position", "Recorded CSV track"];
    let source = match Select::new()
        .with_prompt("Location source")
        .items(&sources)
        .default(0)
        .interact()?
    {
        0 => LocationSource::Position(prompt_position()?),
        _ => {
            let path: String = Input::new().with_prompt("Track file").interact_text()?;
            LocationSource::Track(PathBuf::from(path.trim()))
        }
    };

    let threshold_km: f64 = Input::new()
        .with_prompt("Alert radius (km)")
        .default(AlertConfig::from_env()?.threshold_km)
        .interact_text()?;

    let options = WatchOptions {
        source,
        interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        threshold_km: Some(threshold_km),
        catalog: None,
        dedupe: false,
    };
    watch::run(&options).await
}

fn prompt_position() -> Result<GeoPoint, Box<dyn std::error::Error>> {
    let latitude: f64 = Input::new().with_prompt("Latitude").interact_text()?;
    let longitude: f64 = Input::new().with_prompt("Longitude").interact_text()?;
    Ok(GeoPoint::new(latitude, longitude))
}

fn pick_segment(catalog: &HazardCatalog) -> Result<String, Box<dyn std::error::Error>> {
    let labels: Vec<String> = catalog
        .iter()
        .map(|s| format!("{} ({}, {} risk)", s.name, s.id, s.risk_level))
        .collect();

    let idx = Select::new()
        .with_prompt("Segment")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(catalog.segments()[idx].id.clone())
}
