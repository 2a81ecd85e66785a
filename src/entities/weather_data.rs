//! Weather data entity - Readings fetched from the weather provider.
//!
//! Rows double as a cache: a recent reading for a location is served
//! without calling the provider again.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weather reading database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weather_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Location key, stored trimmed and lowercased
    pub location: String,
    /// Degrees Celsius
    pub temperature: Option<f64>,
    /// Relative humidity, percent
    pub humidity: Option<f64>,
    /// Millimetres
    pub precipitation: Option<f64>,
    /// Metres per second
    pub wind_speed: Option<f64>,
    pub weather_description: Option<String>,
    pub recorded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
