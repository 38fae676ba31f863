//! A hand-fed location provider.
//!
//! [`ManualLocationProvider::channel`] returns the provider together with a
//! [`LocationFeed`] used to push samples or failures into it. The provider
//! accepts exactly one subscriber.

use std::sync::{Mutex, PoisonError};

use safe_drive_hazard_models::{GeoPoint, LocationSample};
use tokio::sync::mpsc;

use crate::{
    LocationError, LocationEvent, LocationProvider, LocationSubscription, SUBSCRIPTION_BUFFER,
};

/// A [`LocationProvider`] fed through a [`LocationFeed`].
#[derive(Debug)]
pub struct ManualLocationProvider {
    rx: Mutex<Option<mpsc::Receiver<LocationEvent>>>,
}

/// Sending half of a [`ManualLocationProvider`].
#[derive(Debug, Clone)]
pub struct LocationFeed {
    tx: mpsc::Sender<LocationEvent>,
}

impl ManualLocationProvider {
    /// Creates a provider and the feed that drives it.
    #[must_use]
    pub fn channel() -> (Self, LocationFeed) {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        (
            Self {
                rx: Mutex::new(Some(rx)),
            },
            LocationFeed { tx },
        )
    }
}

impl LocationProvider for ManualLocationProvider {
    fn subscribe(&self) -> Result<LocationSubscription, LocationError> {
        let rx = self
            .rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(LocationError::AlreadySubscribed)?;

        Ok(LocationSubscription::new(rx, None))
    }
}

impl LocationFeed {
    /// Delivers a sample.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Closed`] if the subscriber has gone away.
    pub async fn push_sample(&self, sample: LocationSample) -> Result<(), LocationError> {
        self.send(LocationEvent::Sample(sample)).await
    }

    /// Delivers a bare position with no speed, heading, or accuracy.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Closed`] if the subscriber has gone away.
    pub async fn push_position(&self, latitude: f64, longitude: f64) -> Result<(), LocationError> {
        self.push_sample(LocationSample::at(GeoPoint::new(latitude, longitude)))
            .await
    }

    /// Delivers a provider failure.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Closed`] if the subscriber has gone away.
    pub async fn push_error(&self, message: impl Into<String>) -> Result<(), LocationError> {
        self.send(LocationEvent::Error(LocationError::Unavailable {
            message: message.into(),
        }))
        .await
    }

    async fn send(&self, event: LocationEvent) -> Result<(), LocationError> {
        self.tx.send(event).await.map_err(|_| LocationError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_pushed_events() {
        let (provider, feed) = ManualLocationProvider::channel();
        let mut sub = provider.subscribe().unwrap();

        feed.push_position(6.6917, 3.4022).await.unwrap();
        feed.push_error("gps lost").await.unwrap();

        let Some(LocationEvent::Sample(sample)) = sub.next().await else {
            panic!("expected a sample");
        };
        assert_eq!(sample.coordinates, GeoPoint::new(6.6917, 3.4022));
        assert!(matches!(
            sub.next().await,
            Some(LocationEvent::Error(LocationError::Unavailable { message })) if message == "gps lost"
        ));
    }

    #[tokio::test]
    async fn second_subscriber_rejected() {
        let (provider, _feed) = ManualLocationProvider::channel();
        let _sub = provider.subscribe().unwrap();
        assert!(matches!(
            provider.subscribe(),
            Err(LocationError::AlreadySubscribed)
        ));
    }

    #[tokio::test]
    async fn push_after_unsubscribe_reports_closed() {
        let (provider, feed) = ManualLocationProvider::channel();
        let sub = provider.subscribe().unwrap();
        sub.unsubscribe();

        assert!(matches!(
            feed.push_position(0.0, 0.0).await,
            Err(LocationError::Closed)
        ));
    }

    #[tokio::test]
    async fn stream_ends_when_feed_dropped() {
        let (provider, feed) = ManualLocationProvider::channel();
        let mut sub = provider.subscribe().unwrap();
        drop(feed);
        assert!(sub.next().await.is_none());
    }
}
