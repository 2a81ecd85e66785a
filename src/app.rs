//! Application context handed to whatever request layer sits on top of `core`.
//!
//! Holds the database handle, the loaded settings and the external
//! collaborators. Nothing in the crate reads these from globals.

use crate::{
    config::settings::Config,
    core::{
        disease::{DiseaseAnalyzer, NewReport, submit_report},
        product::NewProduct,
        user::{NewUser, change_password, register_user},
        weather::{WeatherProvider, current_weather},
    },
    entities::{disease_report, user, weather_data},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared services for one running instance. Share it behind an `Arc`.
pub struct AppContext {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Settings loaded at startup
    pub settings: Arc<Config>,
    /// Plant image analysis service
    pub analyzer: Arc<dyn DiseaseAnalyzer>,
    /// Weather data service
    pub weather: Arc<dyn WeatherProvider>,
}

impl AppContext {
    /// Bundles the services together.
    pub fn new(
        db: DatabaseConnection,
        settings: Arc<Config>,
        analyzer: Arc<dyn DiseaseAnalyzer>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            db,
            settings,
            analyzer,
            weather,
        }
    }

    /// Registers a user with the configured hash cost.
    pub async fn register(&self, new_user: NewUser) -> Result<user::Model> {
        register_user(&self.db, new_user, self.settings.marketplace.password_hash_cost).await
    }

    /// Changes a password with the configured hash cost.
    pub async fn change_password(
        &self,
        account: &user::Model,
        current: &str,
        new_password: &str,
    ) -> Result<()> {
        let cost = self.settings.marketplace.password_hash_cost;
        change_password(&self.db, account, current, new_password, cost).await
    }

    /// Product form pre-filled with the configured reorder level.
    #[must_use]
    pub fn new_product(&self, name: &str, price: f64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            reorder_level: self.settings.marketplace.default_reorder_level,
            ..Default::default()
        }
    }

    /// Submits a disease report through the configured analyzer.
    pub async fn submit_disease_report(
        &self,
        farmer: &user::Model,
        report: NewReport,
    ) -> Result<disease_report::Model> {
        submit_report(&self.db, self.analyzer.as_ref(), farmer, report).await
    }

    /// Current weather, cached for `weather_cache_minutes`.
    pub async fn weather_for(&self, location: &str) -> Result<weather_data::Model> {
        let max_age = chrono::Duration::minutes(self.settings.marketplace.weather_cache_minutes);
        current_weather(&self.db, self.weather.as_ref(), location, max_age).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::product::create_product;
    use crate::entities::Role;
    use crate::test_utils::*;

    async fn context() -> Result<AppContext> {
        let db = setup_test_db().await?;
        let mut settings = Config::default();
        settings.marketplace.password_hash_cost = TEST_HASH_COST;
        settings.marketplace.default_reorder_level = 3;
        Ok(AppContext::new(
            db,
            Arc::new(settings),
            Arc::new(StubAnalyzer::healthy("Remove infected leaves")),
            Arc::new(StubWeather::default()),
        ))
    }

    #[tokio::test]
    async fn test_context_applies_settings() -> Result<()> {
        let ctx = context().await?;
        let seller = ctx
            .register(NewUser {
                email: "Duka@Example.com".to_string(),
                password: TEST_PASSWORD.to_string(),
                password_confirmation: TEST_PASSWORD.to_string(),
                full_name: "Duka Agrovet".to_string(),
                role: Role::Agrovet,
                phone_number: None,
                location: Some("Meru".to_string()),
            })
            .await?;
        assert_eq!(seller.email, "duka@example.com");

        let product = create_product(&ctx.db, &seller, ctx.new_product("Hoe", 450.0)).await?;
        assert_eq!(product.reorder_level, 3);

        ctx.change_password(&seller, TEST_PASSWORD, "new-secret").await?;
        let relogged = crate::core::user::authenticate(&ctx.db, "duka@example.com", "new-secret").await?;
        assert_eq!(relogged.id, seller.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_context_uses_collaborators() -> Result<()> {
        let ctx = context().await?;
        let farmer = create_test_user(&ctx.db, "farmer@example.com", Role::Farmer).await?;

        let report = ctx
            .submit_disease_report(
                &farmer,
                NewReport {
                    image: vec![1, 2, 3],
                    description: "Wilting beans".to_string(),
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(report.treatment_recommendation, "Remove infected leaves");

        let first = ctx.weather_for("Meru").await?;
        let second = ctx.weather_for("Meru").await?;
        assert_eq!(first.id, second.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_context_shared_behind_arc() -> Result<()> {
        let ctx = Arc::new(context().await?);

        let worker = Arc::clone(&ctx);
        let first = tokio::spawn(async move { worker.weather_for("Nyeri").await })
            .await
            .unwrap()?;
        let second = ctx.weather_for("Nyeri").await?;
        assert_eq!(first.id, second.id);
        Ok(())
    }
}
