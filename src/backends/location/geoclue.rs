// SPDX-License-Identifier: GPL-3.0-only

//! GeoClue2 D-Bus integration
//!
//! Asks the system GeoClue2 service for a single fix. Works natively and
//! inside flatpak (through the location portal's GeoClue passthrough).

use super::{Geolocator, Position};
use crate::constants::{APP_ID, services};
use crate::errors::GeolocationError;
use futures::StreamExt;
use tracing::{debug, info, warn};
use zbus::zvariant::OwnedObjectPath;

const GEOCLUE_SERVICE: &str = "org.freedesktop.GeoClue2";
const MANAGER_PATH: &str = "/org/freedesktop/GeoClue2/Manager";
const MANAGER_INTERFACE: &str = "org.freedesktop.GeoClue2.Manager";
const CLIENT_INTERFACE: &str = "org.freedesktop.GeoClue2.Client";
const LOCATION_INTERFACE: &str = "org.freedesktop.GeoClue2.Location";

/// GClueAccuracyLevel::City, enough for a weather lookup
const ACCURACY_CITY: u32 = 4;

/// Locator backed by the GeoClue2 service
#[derive(Debug, Clone, Default)]
pub struct GeoClueLocator;

impl GeoClueLocator {
    pub fn new() -> Self {
        Self
    }
}

impl Geolocator for GeoClueLocator {
    async fn current_position(&self) -> Result<Position, GeolocationError> {
        info!("Requesting location from GeoClue");

        match tokio::time::timeout(services::GEOLOCATION_TIMEOUT, request_fix()).await {
            Ok(Ok(position)) => {
                info!(%position, "GeoClue delivered a fix");
                Ok(position)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "GeoClue request failed");
                Err(classify_error(&e))
            }
            Err(_) => {
                warn!("GeoClue did not deliver a fix in time");
                Err(GeolocationError::Unavailable("timed out".to_string()))
            }
        }
    }
}

async fn request_fix() -> zbus::Result<Position> {
    let connection = zbus::Connection::system().await?;

    let manager = zbus::Proxy::new(&connection, GEOCLUE_SERVICE, MANAGER_PATH, MANAGER_INTERFACE)
        .await?;
    let client_path: OwnedObjectPath = manager.call("GetClient", &()).await?;
    debug!(client = %client_path, "GeoClue client created");

    let client = zbus::Proxy::new(
        &connection,
        GEOCLUE_SERVICE,
        client_path.as_str(),
        CLIENT_INTERFACE,
    )
    .await?;
    client.set_property("DesktopId", APP_ID).await?;
    client
        .set_property("RequestedAccuracyLevel", ACCURACY_CITY)
        .await?;

    // Subscribe before starting so the first update is not missed
    let mut updates = client.receive_signal("LocationUpdated").await?;
    client.call::<_, _, ()>("Start", &()).await?;

    let result = async {
        let message = updates
            .next()
            .await
            .ok_or_else(|| zbus::Error::Failure("LocationUpdated stream ended".to_string()))?;
        let (_old, new): (OwnedObjectPath, OwnedObjectPath) = message.body().deserialize()?;

        let location = zbus::Proxy::new(
            &connection,
            GEOCLUE_SERVICE,
            new.as_str(),
            LOCATION_INTERFACE,
        )
        .await?;
        let latitude: f64 = location.get_property("Latitude").await?;
        let longitude: f64 = location.get_property("Longitude").await?;
        Ok::<_, zbus::Error>(Position::new(latitude, longitude))
    }
    .await;

    if let Err(e) = client.call::<_, _, ()>("Stop", &()).await {
        debug!(error = %e, "Failed to stop GeoClue client");
    }
    result
}

/// Map a D-Bus failure onto the geolocation error taxonomy
fn classify_error(error: &zbus::Error) -> GeolocationError {
    match error {
        zbus::Error::MethodError(name, _, _) => classify_error_name(name.as_str()),
        zbus::Error::FDO(fdo) => match &**fdo {
            zbus::fdo::Error::AccessDenied(_) | zbus::fdo::Error::AuthFailed(_) => {
                GeolocationError::PermissionDenied
            }
            zbus::fdo::Error::ServiceUnknown(_) => GeolocationError::Unsupported,
            other => GeolocationError::Unavailable(other.to_string()),
        },
        zbus::Error::InputOutput(_) | zbus::Error::Address(_) => GeolocationError::Unsupported,
        other => GeolocationError::Unavailable(other.to_string()),
    }
}

/// Map a D-Bus error name onto the geolocation error taxonomy
fn classify_error_name(name: &str) -> GeolocationError {
    match name {
        "org.freedesktop.DBus.Error.AccessDenied" | "org.freedesktop.DBus.Error.AuthFailed" => {
            GeolocationError::PermissionDenied
        }
        "org.freedesktop.DBus.Error.ServiceUnknown"
        | "org.freedesktop.DBus.Error.NameHasNoOwner"
        | "org.freedesktop.DBus.Error.UnknownObject" => GeolocationError::Unsupported,
        other => GeolocationError::Unavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_maps_to_permission_denied() {
        assert_eq!(
            classify_error_name("org.freedesktop.DBus.Error.AccessDenied"),
            GeolocationError::PermissionDenied
        );
    }

    #[test]
    fn test_missing_service_maps_to_unsupported() {
        assert_eq!(
            classify_error_name("org.freedesktop.DBus.Error.ServiceUnknown"),
            GeolocationError::Unsupported
        );
    }

    #[test]
    fn test_other_errors_are_unavailable() {
        assert!(matches!(
            classify_error_name("org.freedesktop.GeoClue2.Error.Failed"),
            GeolocationError::Unavailable(_)
        ));
    }

    #[test]
    fn test_fdo_access_denied() {
        let err = zbus::Error::FDO(Box::new(zbus::fdo::Error::AccessDenied(
            "nope".to_string(),
        )));
        assert_eq!(classify_error(&err), GeolocationError::PermissionDenied);
    }
}
