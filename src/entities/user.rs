//! User entity - Every account on the platform, whatever its role.
//!
//! Users are never hard-deleted; an admin deactivates them instead.
//! The `role` column drives every capability check in `core`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role a user registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Role {
    /// Buys inputs, asks questions, submits disease reports
    #[sea_orm(string_value = "farmer")]
    Farmer,
    /// Retailer of agricultural inputs; owns products and receives orders
    #[sea_orm(string_value = "agrovet")]
    Agrovet,
    /// Reviews disease reports and answers community questions
    #[sea_orm(string_value = "extension_officer")]
    ExtensionOfficer,
    /// Training college or research institution
    #[sea_orm(string_value = "learning_institution")]
    LearningInstitution,
    /// Platform administrator
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    /// Whether users with this role own a cart and place orders.
    #[must_use]
    pub const fn can_purchase(self) -> bool {
        matches!(self, Self::Farmer)
    }

    /// Whether users with this role own inventory and record sales.
    #[must_use]
    pub const fn can_sell(self) -> bool {
        matches!(self, Self::Agrovet)
    }

    /// Whether users with this role may review farmers' disease reports.
    #[must_use]
    pub const fn can_review_disease_reports(self) -> bool {
        matches!(self, Self::ExtensionOfficer | Self::Admin)
    }

    /// Stable lowercase name, identical to the stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Agrovet => "agrovet",
            Self::ExtensionOfficer => "extension_officer",
            Self::LearningInstitution => "learning_institution",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "farmer" => Ok(Self::Farmer),
            "agrovet" => Ok(Self::Agrovet),
            "extension_officer" | "officer" => Ok(Self::ExtensionOfficer),
            "learning_institution" | "institution" => Ok(Self::LearningInstitution),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login email, stored trimmed and lowercased
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt hash of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name
    pub full_name: String,
    /// Registered role
    pub role: Role,
    /// Contact phone number
    pub phone_number: Option<String>,
    /// Free-text location (county, town)
    pub location: Option<String>,
    /// Administrative flag, independent of role
    pub is_admin: bool,
    /// Deactivated users can neither log in nor act
    pub is_active: bool,
    /// Set by an admin after checking the account
    pub is_verified: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// Last successful authentication
    pub last_login: Option<DateTimeUtc>,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An agrovet owns many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    /// A buyer has many cart items
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
    /// A user receives many notifications
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
