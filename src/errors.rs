//! Unified error type for the marketplace core.
//!
//! Every variant except the infrastructure ones (`Database`, `Io`, `EnvVar`,
//! `PasswordHash`) is a recoverable, user-facing failure that the request layer
//! turns into a message and a status code via [`Error::status_code`].

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Referenced entity does not exist or lies outside the caller's scope
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity (e.g. `"product"`)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Caller lacks the role or ownership the operation requires
    #[error("Forbidden: {reason}")]
    Forbidden {
        /// Human-readable reason
        reason: String,
    },

    /// Malformed or missing input
    #[error("Validation failed: {message}")]
    Validation {
        /// Human-readable description of the problem
        message: String,
    },

    /// Adding to or updating a cart beyond what is on hand
    #[error("{product} is out of stock: requested {requested}, available {available}")]
    OutOfStock {
        /// Product name
        product: String,
        /// Requested quantity
        requested: i32,
        /// Quantity on hand at validation time
        available: i32,
    },

    /// A stock decrement (checkout, sale, adjustment) would go below zero
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Product name
        product: String,
        /// Requested quantity
        requested: i32,
        /// Quantity on hand at validation time
        available: i32,
    },

    /// A uniqueness rule would be violated
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable description of the clash
        message: String,
    },

    /// Checkout attempted with nothing in the cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Order or report status change not allowed by its state machine
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// An injected external collaborator (disease API, weather API) failed
    #[error("{service} failed: {message}")]
    External {
        /// Collaborator name
        service: &'static str,
        /// Failure description
        message: String,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Password hashing failure
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`Error::Forbidden`].
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Converts a database error into `Conflict` when it is a unique-constraint
    /// violation, leaving every other database error untouched.
    pub fn from_unique_violation(err: DbErr, message: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict {
                message: message.into(),
            },
            _ => Self::Database(err),
        }
    }

    /// HTTP-equivalent status code for the request layer.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::EmptyCart | Self::InvalidTransition { .. } => 400,
            Self::InvalidCredentials => 401,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::OutOfStock { .. } | Self::InsufficientStock { .. } | Self::Conflict { .. } => {
                409
            }
            Self::External { .. } => 502,
            Self::Config { .. }
            | Self::Database(_)
            | Self::PasswordHash(_)
            | Self::Io(_)
            | Self::EnvVar(_) => 500,
        }
    }

    /// Whether the failure should be shown to the user rather than logged as fatal.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        self.status_code() < 500
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
