//! Weather readings served from a short-lived cache in `weather_data`.

use crate::{
    entities::{WeatherData, weather_data},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// One observation returned by a weather provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherReading {
    /// Degrees Celsius
    pub temperature: Option<f64>,
    /// Relative humidity, percent
    pub humidity: Option<f64>,
    /// Millimetres in the last hour
    pub precipitation: Option<f64>,
    /// Metres per second
    pub wind_speed: Option<f64>,
    /// Short summary ("light rain")
    pub description: Option<String>,
}

/// Weather API collaborator.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions for a place name.
    async fn fetch(&self, location: &str) -> Result<WeatherReading>;
}

/// Current weather for `location`.
///
/// Returns the newest stored reading when it is younger than `max_age`;
/// otherwise asks the provider and records what it returns.
pub async fn current_weather(
    db: &DatabaseConnection,
    provider: &dyn WeatherProvider,
    location: &str,
    max_age: chrono::Duration,
) -> Result<weather_data::Model> {
    let location = location.trim();
    if location.is_empty() {
        return Err(Error::validation("Location cannot be empty"));
    }

    let now = chrono::Utc::now();
    let cached = WeatherData::find()
        .filter(weather_data::Column::Location.eq(location))
        .filter(weather_data::Column::RecordedAt.gt(now - max_age))
        .order_by_desc(weather_data::Column::RecordedAt)
        .one(db)
        .await?;
    if let Some(reading) = cached {
        debug!(location, "Serving cached weather");
        return Ok(reading);
    }

    let fresh = provider.fetch(location).await?;
    weather_data::ActiveModel {
        location: Set(location.to_string()),
        temperature: Set(fresh.temperature),
        humidity: Set(fresh.humidity),
        precipitation: Set(fresh.precipitation),
        wind_speed: Set(fresh.wind_speed),
        weather_description: Set(fresh.description),
        recorded_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
