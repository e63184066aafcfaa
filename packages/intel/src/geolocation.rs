//! Opportunistic device geolocation.
//!
//! A position only enriches the guidance prompt; it is never required.
//! Lookups run in the background and failures are logged and dropped.
//!
//! See <https://ip-api.com/docs/api:json> for the IP lookup format.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use wildsafe_intel_models::Coordinates;

use crate::dashboard::Dashboard;

/// Default IP geolocation endpoint.
pub const IP_API_URL: &str = "http://ip-api.com/json";

/// Errors from geolocation lookups.
#[derive(Debug, Error)]
pub enum GeolocationError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered without a usable position.
    #[error("Lookup failed: {message}")]
    Lookup {
        /// Description of the failure.
        message: String,
    },
}

/// Source of the user's current position.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Resolves the current position.
    ///
    /// # Errors
    ///
    /// Returns [`GeolocationError`] if no position could be determined.
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// A position supplied up front (e.g. from command-line flags).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl GeolocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Approximate position from the caller's public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    client: reqwest::Client,
    url: String,
}

impl IpGeolocation {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Default for IpGeolocation {
    fn default() -> Self {
        Self::new(IP_API_URL)
    }
}

#[async_trait]
impl GeolocationProvider for IpGeolocation {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        let body: serde_json::Value = self
            .client
            .get(&self.url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_response(&body)
    }
}

/// Parses an ip-api JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Coordinates, GeolocationError> {
    if body["status"].as_str() == Some("fail") {
        return Err(GeolocationError::Lookup {
            message: body["message"]
                .as_str()
                .unwrap_or("unknown failure")
                .to_string(),
        });
    }

    let latitude = body["lat"].as_f64().ok_or_else(|| GeolocationError::Lookup {
        message: "Missing lat in response".to_string(),
    })?;
    let longitude = body["lon"].as_f64().ok_or_else(|| GeolocationError::Lookup {
        message: "Missing lon in response".to_string(),
    })?;

    Ok(Coordinates {
        latitude,
        longitude,
    })
}

/// Looks up the position in the background and stores it on `dashboard`.
///
/// The position is picked up by the next refresh cycle; it does not
/// trigger one.
pub fn spawn_locate(
    provider: Arc<dyn GeolocationProvider>,
    dashboard: Arc<Dashboard>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match provider.locate().await {
            Ok(coordinates) => {
                log::debug!(
                    "Located device at {:.4}, {:.4}",
                    coordinates.latitude,
                    coordinates.longitude
                );
                dashboard.set_coordinates(coordinates);
            }
            Err(e) => log::debug!("Geolocation unavailable: {e}"),
        }
    })
}
