#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location provider interface.
//!
//! A [`LocationProvider`] hands out a [`LocationSubscription`]: a stream of
//! [`LocationEvent`]s carrying either a new [`LocationSample`] or a
//! provider failure. Samples arrive serially on an unspecified cadence.
//! Dropping the subscription (or calling
//! [`LocationSubscription::unsubscribe`]) stops the provider.
//!
//! Two providers ship with the crate:
//!
//! - [`replay::TrackReplayProvider`] replays a recorded CSV track at a
//!   fixed interval.
//! - [`manual::ManualLocationProvider`] is fed by hand through a
//!   [`manual::LocationFeed`] handle.

pub mod manual;
pub mod replay;

use safe_drive_hazard_models::LocationSample;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Buffer size of the channel between a provider and its subscriber.
pub const SUBSCRIPTION_BUFFER: usize = 64;

/// Errors raised by location providers.
#[derive(Debug, Error)]
pub enum LocationError {
    /// A track file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A track file could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The provider cannot start or failed mid-stream.
    #[error("Location provider unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The provider only supports a single subscriber.
    #[error("Location provider already has a subscriber")]
    AlreadySubscribed,

    /// The subscriber has gone away.
    #[error("Location subscription closed")]
    Closed,
}

/// An event delivered to a subscriber.
#[derive(Debug)]
pub enum LocationEvent {
    /// A fresh position sample.
    Sample(LocationSample),
    /// A provider failure. The stream stays open and may resume.
    Error(LocationError),
}

/// A source of live location samples.
pub trait LocationProvider: Send + Sync {
    /// Starts delivering location events.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError`] if the provider cannot start.
    fn subscribe(&self) -> Result<LocationSubscription, LocationError>;
}

/// A live stream of location events.
///
/// Unsubscribes on drop.
#[derive(Debug)]
pub struct LocationSubscription {
    rx: mpsc::Receiver<LocationEvent>,
    task: Option<JoinHandle<()>>,
}

impl LocationSubscription {
    /// Wraps a receiver and, optionally, the task producing into it. The
    /// task is aborted when the subscription ends.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<LocationEvent>, task: Option<JoinHandle<()>>) -> Self {
        Self { rx, task }
    }

    /// Waits for the next event. Returns `None` once the provider has
    /// finished or the subscription was closed.
    pub async fn next(&mut self) -> Option<LocationEvent> {
        self.rx.recv().await
    }

    /// Stops the provider and discards any undelivered events.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for LocationSubscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Fails with [`LocationError::Unavailable`] when called outside a tokio
/// runtime, since providers spawn their producers onto it.
fn current_runtime() -> Result<tokio::runtime::Handle, LocationError> {
    tokio::runtime::Handle::try_current().map_err(|e| LocationError::Unavailable {
        message: format!("no async runtime: {e}"),
    })
}
