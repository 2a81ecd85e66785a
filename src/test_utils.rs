//! Shared test utilities for `AgriConnect`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults, plus in-process stand-ins
//! for the external disease and weather services.

use crate::{
    core::{
        disease::{Diagnosis, DiseaseAnalyzer},
        product::{self, NewProduct},
        user::{self, NewUser},
        weather::{WeatherProvider, WeatherReading},
    },
    entities::{self, Role},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lowest bcrypt cost, so hashing does not dominate test time.
pub const TEST_HASH_COST: u32 = crate::config::settings::MIN_HASH_COST;

/// Password given to every user made by [`create_test_user`].
pub const TEST_PASSWORD: &str = "shamba-2024";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers an active user with [`TEST_PASSWORD`].
///
/// # Defaults
/// * `full_name`: the part of the email before `@`
/// * `phone_number`, `location`: None
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    role: Role,
) -> Result<entities::user::Model> {
    let full_name = email.split('@').next().unwrap_or(email).to_string();
    user::register_user(
        db,
        NewUser {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            password_confirmation: TEST_PASSWORD.to_string(),
            full_name,
            role,
            phone_number: None,
            location: None,
        },
        TEST_HASH_COST,
    )
    .await
}

/// Test database with one agrovet already registered.
pub async fn setup_with_agrovet() -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let seller = create_test_user(&db, "agrovet@example.com", Role::Agrovet).await?;
    Ok((db, seller))
}

/// Creates a product with the given price and opening stock.
/// Everything else keeps the [`NewProduct`] defaults.
pub async fn create_test_product(
    db: &DatabaseConnection,
    seller: &entities::user::Model,
    name: &str,
    price: f64,
    quantity: i32,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        seller,
        NewProduct {
            name: name.to_string(),
            price,
            quantity,
            ..Default::default()
        },
    )
    .await
}

/// An unsaved, active user model for tests that never reach the database.
pub fn sample_user(id: i64, role: Role) -> entities::user::Model {
    entities::user::Model {
        id,
        email: format!("user{id}@example.com"),
        password_hash: String::new(),
        full_name: format!("User {id}"),
        role,
        phone_number: None,
        location: None,
        is_admin: role == Role::Admin,
        is_active: true,
        is_verified: false,
        created_at: chrono::Utc::now(),
        last_login: None,
    }
}

/// Analyzer returning a fixed diagnosis, or failing like an unreachable API.
pub struct StubAnalyzer {
    outcome: Option<Diagnosis>,
}

impl StubAnalyzer {
    /// Recognises a plant and recommends `treatment`.
    pub fn healthy(treatment: &str) -> Self {
        Self {
            outcome: Some(Diagnosis {
                is_plant: true,
                treatment_recommendation: treatment.to_string(),
            }),
        }
    }

    /// Always fails with `External`.
    pub const fn failing() -> Self {
        Self { outcome: None }
    }
}

#[async_trait]
impl DiseaseAnalyzer for StubAnalyzer {
    async fn analyze(&self, _image: &[u8], _description: &str) -> Result<Diagnosis> {
        self.outcome.clone().ok_or_else(|| Error::External {
            service: "disease analyzer",
            message: "service unavailable".to_string(),
        })
    }
}

/// Weather provider that counts its calls.
#[derive(Default)]
pub struct StubWeather {
    calls: AtomicUsize,
    fail: bool,
}

impl StubWeather {
    /// Always fails with `External`.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// How many times `fetch` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn fetch(&self, location: &str) -> Result<WeatherReading> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::External {
                service: "weather",
                message: format!("no data for {location}"),
            });
        }
        Ok(WeatherReading {
            temperature: Some(22.5),
            humidity: Some(64.0),
            precipitation: Some(0.0),
            wind_speed: Some(3.1),
            description: Some("partly cloudy".to_string()),
        })
    }
}
