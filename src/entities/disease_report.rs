//! Disease report entity - A farmer's plant photo plus the automated diagnosis.
//!
//! Reports start `pending`; an extension officer moves them to `reviewed`
//! and then `treated`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review progress of a disease report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReportStatus {
    /// Diagnosed automatically, not yet seen by an officer
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Checked by an officer
    #[sea_orm(string_value = "reviewed")]
    Reviewed,
    /// Farmer applied the treatment
    #[sea_orm(string_value = "treated")]
    Treated,
}

impl ReportStatus {
    /// Reports only move forward, one step at a time.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Reviewed) | (Self::Reviewed, Self::Treated)
        )
    }

    /// Stored lowercase value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Treated => "treated",
        }
    }
}

/// Disease report database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "disease_reports")]
pub struct Model {
    /// Unique identifier for the report
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Farmer who submitted it
    pub farmer_id: i64,
    /// Stored image reference (file storage is external)
    pub plant_image: Option<String>,
    /// Diagnosis text from the analyzer
    pub plant_description: String,
    /// Recommended treatment from the analyzer
    pub treatment_recommendation: String,
    /// Whether the analyzer recognised a plant at all
    pub is_plant: bool,
    /// Free-text location
    pub location: Option<String>,
    /// Latitude, if known
    pub latitude: Option<f64>,
    /// Longitude, if known
    pub longitude: Option<f64>,
    /// Review progress
    pub status: ReportStatus,
    /// Officer who last reviewed the report
    pub reviewed_by: Option<i64>,
    /// When the report was submitted
    pub created_at: DateTimeUtc,
}

/// Reports are looked up by farmer id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
