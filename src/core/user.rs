//! Identity and access - registration, authentication and account administration.
//!
//! Passwords are stored as bcrypt hashes. Accounts are never hard-deleted:
//! deactivation flips `is_active`, and every role-gated operation elsewhere in
//! `core` starts with one of the capability checks defined here.

use crate::{
    entities::{Role, User, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument, warn};

const MIN_PASSWORD_LEN: usize = 6;

/// Registration form after decoding.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Must equal `password`
    pub password_confirmation: String,
    /// Display name
    pub full_name: String,
    /// Requested role
    pub role: Role,
    /// Contact phone
    pub phone_number: Option<String>,
    /// Free-text location
    pub location: Option<String>,
}

/// Editable profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New display name
    pub full_name: Option<String>,
    /// New phone number
    pub phone_number: Option<String>,
    /// New location
    pub location: Option<String>,
}

/// Whether the user holds administrative rights, by flag or by role.
#[must_use]
pub fn is_admin(user: &user::Model) -> bool {
    user.is_admin || user.role == Role::Admin
}

/// Fails with `Forbidden` unless the account is active.
pub fn require_active(user: &user::Model) -> Result<()> {
    if user.is_active {
        Ok(())
    } else {
        Err(Error::forbidden("account is deactivated"))
    }
}

/// Fails with `Forbidden` unless the user is an active agrovet.
pub fn require_seller(user: &user::Model) -> Result<()> {
    require_active(user)?;
    if user.role.can_sell() {
        Ok(())
    } else {
        Err(Error::forbidden("only agrovets can manage inventory"))
    }
}

/// Fails with `Forbidden` unless the user is an active buyer.
pub fn require_buyer(user: &user::Model) -> Result<()> {
    require_active(user)?;
    if user.role.can_purchase() {
        Ok(())
    } else {
        Err(Error::forbidden("only farmers can shop"))
    }
}

/// Fails with `Forbidden` unless the user is an active administrator.
pub fn require_admin(user: &user::Model) -> Result<()> {
    require_active(user)?;
    if is_admin(user) {
        Ok(())
    } else {
        Err(Error::forbidden("administrator rights required"))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Creates a new account.
///
/// # Errors
/// Returns an error if:
/// - The email or name is empty, or the email has no `@`
/// - The password is too short or does not match its confirmation
/// - Another account already uses the email (`Conflict`)
#[instrument(skip(db, new_user), fields(email = %new_user.email, role = ?new_user.role))]
pub async fn register_user(
    db: &DatabaseConnection,
    new_user: NewUser,
    hash_cost: u32,
) -> Result<user::Model> {
    let email = normalize_email(&new_user.email);
    if email.is_empty() || !email.contains('@') {
        return Err(Error::validation("A valid email address is required"));
    }
    if new_user.full_name.trim().is_empty() {
        return Err(Error::validation("Full name cannot be empty"));
    }
    validate_password(&new_user.password)?;
    if new_user.password != new_user.password_confirmation {
        return Err(Error::validation("Passwords do not match"));
    }

    if get_user_by_email(db, &email).await?.is_some() {
        return Err(Error::Conflict {
            message: format!("Email {email} is already registered"),
        });
    }

    let password_hash = bcrypt::hash(&new_user.password, hash_cost)?;
    let account = user::ActiveModel {
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        full_name: Set(new_user.full_name.trim().to_string()),
        role: Set(new_user.role),
        phone_number: Set(new_user.phone_number),
        location: Set(new_user.location),
        is_admin: Set(new_user.role == Role::Admin),
        is_active: Set(true),
        is_verified: Set(false),
        created_at: Set(chrono::Utc::now()),
        last_login: Set(None),
        ..Default::default()
    };

    let created = account
        .insert(db)
        .await
        .map_err(|e| Error::from_unique_violation(e, format!("Email {email} is already registered")))?;
    info!(user_id = created.id, "Registered new user");
    Ok(created)
}

/// Checks credentials and records the login time.
///
/// # Errors
/// Returns `InvalidCredentials` for an unknown email or wrong password, and
/// `Forbidden` for a deactivated account.
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<user::Model> {
    let Some(account) = get_user_by_email(db, &normalize_email(email)).await? else {
        return Err(Error::InvalidCredentials);
    };

    if !bcrypt::verify(password, &account.password_hash)? {
        warn!(user_id = account.id, "Failed login attempt");
        return Err(Error::InvalidCredentials);
    }
    require_active(&account)?;

    let mut active: user::ActiveModel = account.into();
    active.last_login = Set(Some(chrono::Utc::now()));
    active.update(db).await.map_err(Into::into)
}

/// Retrieves a user by id.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Retrieves a user by (normalized) email.
pub async fn get_user_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists active users with the given role, alphabetically.
pub async fn list_users_by_role(db: &DatabaseConnection, role: Role) -> Result<Vec<user::Model>> {
    User::find()
        .filter(user::Column::Role.eq(role))
        .filter(user::Column::IsActive.eq(true))
        .order_by_asc(user::Column::FullName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates the caller's own profile.
pub async fn update_profile(
    db: &DatabaseConnection,
    user: &user::Model,
    changes: ProfileUpdate,
) -> Result<user::Model> {
    require_active(user)?;
    let mut active: user::ActiveModel = user.clone().into();

    if let Some(full_name) = changes.full_name {
        if full_name.trim().is_empty() {
            return Err(Error::validation("Full name cannot be empty"));
        }
        active.full_name = Set(full_name.trim().to_string());
    }
    if let Some(phone) = changes.phone_number {
        active.phone_number = Set(Some(phone));
    }
    if let Some(location) = changes.location {
        active.location = Set(Some(location));
    }

    active.update(db).await.map_err(Into::into)
}

/// Replaces the caller's password after checking the current one.
pub async fn change_password(
    db: &DatabaseConnection,
    user: &user::Model,
    current_password: &str,
    new_password: &str,
    hash_cost: u32,
) -> Result<()> {
    require_active(user)?;
    if !bcrypt::verify(current_password, &user.password_hash)? {
        return Err(Error::InvalidCredentials);
    }
    validate_password(new_password)?;

    let mut active: user::ActiveModel = user.clone().into();
    active.password_hash = Set(bcrypt::hash(new_password, hash_cost)?);
    active.update(db).await?;
    Ok(())
}

async fn set_account_flag(
    db: &DatabaseConnection,
    admin: &user::Model,
    target_id: i64,
    apply: impl FnOnce(&mut user::ActiveModel),
) -> Result<user::Model> {
    require_admin(admin)?;
    let target = get_user_by_id(db, target_id)
        .await?
        .ok_or_else(|| Error::not_found("user", target_id))?;

    let mut active: user::ActiveModel = target.into();
    apply(&mut active);
    active.update(db).await.map_err(Into::into)
}

/// Deactivates an account. The row and its history stay in place.
pub async fn deactivate_user(
    db: &DatabaseConnection,
    admin: &user::Model,
    target_id: i64,
) -> Result<user::Model> {
    if admin.id == target_id {
        return Err(Error::validation("Administrators cannot deactivate themselves"));
    }
    let updated = set_account_flag(db, admin, target_id, |u| u.is_active = Set(false)).await?;
    info!(user_id = target_id, admin_id = admin.id, "Deactivated user");
    Ok(updated)
}

/// Marks an account as verified.
pub async fn verify_user(
    db: &DatabaseConnection,
    admin: &user::Model,
    target_id: i64,
) -> Result<user::Model> {
    set_account_flag(db, admin, target_id, |u| u.is_verified = Set(true)).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn form(email: &str, password: &str, confirmation: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: password.to_string(),
            password_confirmation: confirmation.to_string(),
            full_name: "Wanjiku Kamau".to_string(),
            role: Role::Farmer,
            phone_number: Some("0712345678".to_string()),
            location: Some("Nakuru".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = register_user(&db, form("", "secret1", "secret1"), TEST_HASH_COST).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = register_user(&db, form("a@b.co", "short", "short"), TEST_HASH_COST).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result =
            register_user(&db, form("a@b.co", "secret1", "secret2"), TEST_HASH_COST).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_register_and_authenticate() -> Result<()> {
        let db = setup_test_db().await?;

        let created = register_user(
            &db,
            form("  Wanjiku@Example.com ", "secret1", "secret1"),
            TEST_HASH_COST,
        )
        .await?;
        assert_eq!(created.email, "wanjiku@example.com");
        assert!(created.is_active);
        assert!(!created.is_verified);
        assert!(!created.is_admin);
        assert_ne!(created.password_hash, "secret1");

        let logged_in = authenticate(&db, "WANJIKU@example.com", "secret1").await?;
        assert_eq!(logged_in.id, created.id);
        assert!(logged_in.last_login.is_some());

        let wrong = authenticate(&db, "wanjiku@example.com", "nope").await;
        assert!(matches!(wrong.unwrap_err(), Error::InvalidCredentials));

        let unknown = authenticate(&db, "ghost@example.com", "secret1").await;
        assert!(matches!(unknown.unwrap_err(), Error::InvalidCredentials));

        Ok(())
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        register_user(&db, form("dup@example.com", "secret1", "secret1"), TEST_HASH_COST).await?;

        let result =
            register_user(&db, form("DUP@example.com", "secret1", "secret1"), TEST_HASH_COST).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_deactivated_user_cannot_log_in() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_user(&db, "admin@example.com", Role::Admin).await?;
        let farmer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;

        let deactivated = deactivate_user(&db, &admin, farmer.id).await?;
        assert!(!deactivated.is_active);

        let result = authenticate(&db, "farmer@example.com", TEST_PASSWORD).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));

        // Row is still there
        assert!(get_user_by_id(&db, farmer.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_only_admins_manage_accounts() -> Result<()> {
        let db = setup_test_db().await?;
        let farmer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;
        let other = create_test_user(&db, "other@example.com", Role::Agrovet).await?;

        let result = verify_user(&db, &farmer, other.id).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));

        let admin = create_test_user(&db, "admin@example.com", Role::Admin).await?;
        let verified = verify_user(&db, &admin, other.id).await?;
        assert!(verified.is_verified);

        let missing = verify_user(&db, &admin, 999).await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_profile_and_change_password() -> Result<()> {
        let db = setup_test_db().await?;
        let farmer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;

        let updated = update_profile(
            &db,
            &farmer,
            ProfileUpdate {
                location: Some("Eldoret".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.location.as_deref(), Some("Eldoret"));
        assert_eq!(updated.full_name, farmer.full_name);

        change_password(&db, &updated, TEST_PASSWORD, "newsecret", TEST_HASH_COST).await?;
        assert!(authenticate(&db, "farmer@example.com", "newsecret").await.is_ok());

        let result = change_password(&db, &updated, "wrong", "another1", TEST_HASH_COST).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidCredentials));
        Ok(())
    }

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Farmer.can_purchase());
        assert!(!Role::Agrovet.can_purchase());
        assert!(Role::Agrovet.can_sell());
        assert!(Role::ExtensionOfficer.can_review_disease_reports());
        assert!(!Role::Farmer.can_review_disease_reports());
        assert_eq!("officer".parse::<Role>().unwrap(), Role::ExtensionOfficer);
        assert!("gardener".parse::<Role>().is_err());
    }
}
