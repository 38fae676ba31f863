//! Replays a recorded drive from a CSV track.
//!
//! The track has a header row and the columns
//! `latitude,longitude,speed_mps,heading,accuracy`; the last three may be
//! left empty. Rows that fail to parse are replayed in place as provider
//! errors rather than aborting the whole track, so a consumer sees the same
//! mid-stream failure it would get from a flaky GPS receiver.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use safe_drive_hazard_models::{LocationSample, RawFix};
use tokio::sync::mpsc;

use crate::{
    LocationError, LocationEvent, LocationProvider, LocationSubscription, SUBSCRIPTION_BUFFER,
    current_runtime,
};

/// One entry of a recorded track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackPoint {
    /// A usable position fix.
    Fix(RawFix),
    /// A row that could not be parsed.
    Malformed {
        /// 1-based line number in the source file.
        line: u64,
        /// Parser message.
        message: String,
    },
}

/// A [`LocationProvider`] that replays a fixed list of track points.
#[derive(Debug, Clone)]
pub struct TrackReplayProvider {
    points: Vec<TrackPoint>,
    interval: Duration,
}

impl TrackReplayProvider {
    /// Creates a provider from already-parsed fixes.
    #[must_use]
    pub fn from_fixes(fixes: Vec<RawFix>, interval: Duration) -> Self {
        Self {
            points: fixes.into_iter().map(TrackPoint::Fix).collect(),
            interval,
        }
    }

    /// Parses a CSV track from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Csv`] if the header row cannot be read.
    pub fn from_reader<R: Read>(reader: R, interval: Duration) -> Result<Self, LocationError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        csv_reader.headers()?;

        let mut points = Vec::new();
        for (i, record) in csv_reader.deserialize::<RawFix>().enumerate() {
            match record {
                Ok(fix) => points.push(TrackPoint::Fix(fix)),
                Err(e) => {
                    let line = e
                        .position()
                        .map_or(i as u64 + 2, csv::Position::line);
                    log::warn!("Skipping malformed track row at line {line}: {e}");
                    points.push(TrackPoint::Malformed {
                        line,
                        message: e.to_string(),
                    });
                }
            }
        }

        log::debug!("Parsed track with {} points", points.len());

        Ok(Self { points, interval })
    }

    /// Loads a CSV track from disk.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError`] if the file cannot be opened or its header
    /// cannot be read.
    pub fn from_csv_path(path: &Path, interval: Duration) -> Result<Self, LocationError> {
        let file = std::fs::File::open(path)?;
        let provider = Self::from_reader(file, interval)?;
        log::info!(
            "Loaded track {} ({} points)",
            path.display(),
            provider.points.len()
        );
        Ok(provider)
    }

    /// The points that will be replayed, in order.
    #[must_use]
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }
}

impl LocationProvider for TrackReplayProvider {
    fn subscribe(&self) -> Result<LocationSubscription, LocationError> {
        let runtime = current_runtime()?;
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let points = self.points.clone();
        let interval = self.interval;

        let task = runtime.spawn(async move {
            for (i, point) in points.into_iter().enumerate() {
                if i > 0 && !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }

                let event = match point {
                    TrackPoint::Fix(fix) => LocationEvent::Sample(LocationSample::from_raw_fix(fix)),
                    TrackPoint::Malformed { line, message } => {
                        LocationEvent::Error(LocationError::Unavailable {
                            message: format!("bad fix at line {line}: {message}"),
                        })
                    }
                };

                if tx.send(event).await.is_err() {
                    log::debug!("Track replay subscriber dropped; stopping");
                    return;
                }
            }
            log::debug!("Track replay finished");
        });

        Ok(LocationSubscription::new(rx, Some(task)))
    }
}
