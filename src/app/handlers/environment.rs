// SPDX-License-Identifier: GPL-3.0-only

//! Environment overlay handler

use crate::app::state::{AppModel, Command};
use crate::environment::EnvironmentUpdate;
use tracing::debug;

impl AppModel {
    pub(crate) fn handle_environment_update(&mut self, update: EnvironmentUpdate) -> Vec<Command> {
        debug!(?update, "Environment update");
        self.environment.apply(update);
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::app::state::{AppModel, Flags, Message, Stage};
    use crate::backends::location::Position;
    use crate::environment::EnvironmentUpdate;
    use crate::errors::{GeolocationError, WeatherError};

    #[test]
    fn test_updates_fill_reading_in_any_stage() {
        let (mut model, _) = AppModel::init(Flags::default());
        assert_eq!(model.stage, Stage::Notification);

        model.update(Message::Environment(EnvironmentUpdate::Location(Ok(
            Position::new(1.0, 2.0),
        ))));
        model.update(Message::Environment(EnvironmentUpdate::Temperature(Ok(-3))));
        model.update(Message::Environment(EnvironmentUpdate::AirQuality(Some(120))));

        assert_eq!(model.environment.temperature_c, Some(-3));
        assert_eq!(model.environment.aqi, Some(120));
        assert_eq!(
            model.environment.aqi_category().label(),
            "Unhealthy for Sensitive Groups"
        );
        assert_eq!(model.environment.status_message(), None);
    }

    #[test]
    fn test_error_messages() {
        let (mut model, _) = AppModel::init(Flags::default());
        model.update(Message::Environment(EnvironmentUpdate::Location(Err(
            GeolocationError::PermissionDenied,
        ))));
        assert_eq!(
            model.environment.status_message(),
            Some("Location access denied. Enable location for weather.")
        );

        let (mut model, _) = AppModel::init(Flags::default());
        model.update(Message::Environment(EnvironmentUpdate::Location(Ok(
            Position::new(1.0, 2.0),
        ))));
        model.update(Message::Environment(EnvironmentUpdate::Temperature(Err(
            WeatherError::Network("timeout".into()),
        ))));
        assert_eq!(
            model.environment.status_message(),
            Some("Failed to load weather data.")
        );
        assert_eq!(model.environment.temperature_c, None);
    }
}
