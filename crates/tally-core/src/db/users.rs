//! User operations: registration, login, profile and settings

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use super::changes::ChangeKind;
use super::schema::{IndexedField, Table};
use super::store::{
    clear_table, encode_timestamp, fetch_equal, fetch_one, get_timestamp, now_timestamp,
    IndexValue, Record,
};
use super::Database;
use crate::error::{Error, Result};
use crate::models::{NewUser, SettingsPatch, UserProfile, UserSettings};

/// Seed account created on first run
pub const DEMO_USER_EMAIL: &str = "demo@example.com";
const DEMO_USER_NAME: &str = "Demo User";
const DEMO_USER_PASSWORD: &str = "demo123";

/// Full user row, including the password hash. Never leaves this module.
#[derive(Debug, Clone)]
struct UserRecord {
    id: i64,
    email: String,
    password_hash: String,
    name: String,
    settings: UserSettings,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRecord {
    fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            name: self.name,
            settings: self.settings,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Record for UserRecord {
    const TABLE: Table = Table::Users;
    const COLUMNS: &'static str =
        "id, email, password_hash, name, settings, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let settings_json: String = row.get(4)?;
        let settings = serde_json::from_str(&settings_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            name: row.get(3)?,
            settings,
            created_at: get_timestamp(row, 5)?,
            updated_at: get_timestamp(row, 6)?,
        })
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| Error::PasswordHash(format!("Stored hash is unreadable: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Insert the user row with default settings. A UNIQUE violation on email
/// (a concurrent registration won the race) is reported as `DuplicateUser`.
pub(super) fn insert_user(conn: &Connection, user: &NewUser, password_hash: &str) -> Result<i64> {
    let email = user.email.trim();
    let settings = serde_json::to_string(&UserSettings::default())?;
    let now = encode_timestamp(now_timestamp());

    conn.execute(
        r#"
        INSERT INTO users (email, password_hash, name, settings, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
        params![email, password_hash, user.name.trim(), settings, now, now],
    )
    .map_err(|e| match Error::from_write(e, "users.email") {
        Error::Constraint(_) => Error::DuplicateUser(email.to_string()),
        other => other,
    })?;

    Ok(conn.last_insert_rowid())
}

impl Database {
    fn user_record(&self, user_id: i64) -> Result<UserRecord> {
        self.get::<UserRecord>(user_id)?
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))
    }

    fn user_record_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn()?;
        let mut matches: Vec<UserRecord> =
            fetch_equal(&conn, IndexedField::USER_EMAIL, &IndexValue::from(email.trim()))?;
        Ok(matches.pop())
    }

    /// Register a new user with default settings. Emails are case-sensitive.
    pub fn register_user(&self, user: &NewUser) -> Result<i64> {
        user.validate()?;
        let email = user.email.trim();

        if self.user_record_by_email(email)?.is_some() {
            return Err(Error::DuplicateUser(email.to_string()));
        }

        let password_hash = hash_password(&user.password)?;
        let conn = self.conn()?;
        let id = insert_user(&conn, user, &password_hash)?;

        info!("Registered user {}", id);
        self.notify(Table::Users, ChangeKind::Inserted, Some(id));
        Ok(id)
    }

    /// Check credentials and return the profile (without password)
    pub fn login_user(&self, email: &str, password: &str) -> Result<UserProfile> {
        let record = self
            .user_record_by_email(email)?
            .ok_or_else(|| Error::NotFound(format!("user {}", email.trim())))?;

        if !verify_password(password, &record.password_hash)? {
            return Err(Error::InvalidCredentials);
        }

        debug!("User {} logged in", record.id);
        Ok(record.into_profile())
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<UserProfile>> {
        Ok(self.get::<UserRecord>(user_id)?.map(UserRecord::into_profile))
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .user_record_by_email(email)?
            .map(UserRecord::into_profile))
    }

    pub fn list_users(&self) -> Result<Vec<UserProfile>> {
        Ok(self
            .all::<UserRecord>()?
            .into_iter()
            .map(UserRecord::into_profile)
            .collect())
    }

    /// Shallow-merge `patch` into the user's settings and return the result
    pub fn update_user_settings(&self, user_id: i64, patch: &SettingsPatch) -> Result<UserSettings> {
        patch.validate()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut record = fetch_one::<UserRecord>(&tx, user_id)?
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;
        patch.apply(&mut record.settings);
        let updated_at = now_timestamp().max(record.updated_at);

        tx.execute(
            "UPDATE users SET settings = ?, updated_at = ? WHERE id = ?",
            params![
                serde_json::to_string(&record.settings)?,
                encode_timestamp(updated_at),
                user_id
            ],
        )?;
        tx.commit()?;

        self.notify(Table::Users, ChangeKind::Updated, Some(user_id));
        Ok(record.settings)
    }

    /// Replace the password after checking the current one.
    /// Length policy is left to the caller (see `MIN_PASSWORD_LEN`).
    pub fn update_user_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if new_password.is_empty() {
            return Err(Error::Validation("new password is required".to_string()));
        }

        let record = self.user_record(user_id)?;
        if !verify_password(current_password, &record.password_hash)? {
            return Err(Error::InvalidCredentials);
        }

        let hash = hash_password(new_password)?;
        let updated_at = now_timestamp().max(record.updated_at);

        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?",
            params![hash, encode_timestamp(updated_at), user_id],
        )?;

        info!("Password changed for user {}", user_id);
        self.notify(Table::Users, ChangeKind::Updated, Some(user_id));
        Ok(())
    }

    pub fn update_user_name(&self, user_id: i64, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }

        let record = self.user_record(user_id)?;
        let updated_at = now_timestamp().max(record.updated_at);

        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET name = ?, updated_at = ? WHERE id = ?",
            params![name, encode_timestamp(updated_at), user_id],
        )?;

        self.notify(Table::Users, ChangeKind::Updated, Some(user_id));
        Ok(())
    }

    /// Delete only the user row (idempotent)
    pub fn delete_user(&self, user_id: i64) -> Result<bool> {
        self.delete_row(Table::Users, user_id)
    }

    /// First-run seed: register the demo account when there are no users.
    /// Returns the new id, or `None` if users already exist.
    pub fn ensure_demo_user(&self) -> Result<Option<i64>> {
        if self.count(Table::Users)? > 0 {
            return Ok(None);
        }

        let id = self.register_user(&NewUser {
            email: DEMO_USER_EMAIL.to_string(),
            password: DEMO_USER_PASSWORD.to_string(),
            name: DEMO_USER_NAME.to_string(),
        })?;
        info!("Created demo user");
        Ok(Some(id))
    }

    /// Delete a user together with all money records.
    ///
    /// The local store holds a single user's data, so the four transactional
    /// tables are emptied outright. Runs as one transaction.
    pub fn delete_account(&self, user_id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if fetch_one::<UserRecord>(&tx, user_id)?.is_none() {
            return Err(Error::NotFound(format!("user {}", user_id)));
        }

        for table in Table::TRANSACTIONAL {
            clear_table(&tx, table)?;
        }
        tx.execute("DELETE FROM users WHERE id = ?", params![user_id])?;
        tx.commit()?;

        for table in Table::TRANSACTIONAL {
            self.notify(table, ChangeKind::Cleared, None);
        }
        self.notify(Table::Users, ChangeKind::Deleted, Some(user_id));

        info!("Deleted account {}", user_id);
        Ok(())
    }
}
