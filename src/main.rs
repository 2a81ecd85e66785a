//! Bootstrap binary: prepares the database and seeds administrator accounts.

use agriconnect::{
    config::{database, settings},
    core::user::{NewUser, get_user_by_email, list_users_by_role, register_user},
    entities::Role,
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Load settings
    let config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and create the schema
    std::fs::create_dir_all("data")?;
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready"))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed administrators from config.toml
    if !config.admins.is_empty() {
        let password = env::var("ADMIN_PASSWORD")
            .inspect_err(|e| error!("ADMIN_PASSWORD not set: {}", e))
            .map_err(Error::EnvVar)?;
        for admin in &config.admins {
            if get_user_by_email(&db, &admin.email.trim().to_lowercase()).await?.is_some() {
                continue;
            }
            let seeded = register_user(
                &db,
                NewUser {
                    email: admin.email.clone(),
                    password: password.clone(),
                    password_confirmation: password.clone(),
                    full_name: admin.full_name.clone(),
                    role: Role::Admin,
                    phone_number: None,
                    location: None,
                },
                config.marketplace.password_hash_cost,
            )
            .await?;
            info!(user_id = seeded.id, email = %seeded.email, "Seeded administrator");
        }
    }

    let admins = list_users_by_role(&db, Role::Admin).await?;
    if admins.is_empty() {
        warn!("No administrator accounts exist");
    }
    info!(admins = admins.len(), "AgriConnect core ready");
    Ok(())
}
