//! Error types for Tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("User already exists with this email: {0}")]
    DuplicateUser(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Replication error: {0}")]
    Replication(String),
}

impl Error {
    /// Map a SQLite unique/check constraint failure to `Constraint`,
    /// leaving every other error untouched.
    pub(crate) fn from_write(err: rusqlite::Error, what: &str) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Constraint(format!(
                    "{}: {}",
                    what,
                    msg.as_deref().unwrap_or("constraint failed")
                ))
            }
            other => Error::Database(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
