//! The `users` table.

use crate::IdentityError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use vocalis_db::DbPool;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

impl User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

/// Looks users up by email for the token verifier.
pub trait UserDirectory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError>;
}

/// [`UserDirectory`] over the pooled SQLite store.
///
/// Lookups block; call from `spawn_blocking` in async contexts.
#[derive(Clone, Debug)]
pub struct SqliteUserDirectory {
    pool: DbPool,
}

impl SqliteUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl UserDirectory for SqliteUserDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        let conn = self.pool.get()?;
        get_user_by_email(&conn, email)
    }
}

/// Inserts a user row. The caller hashes the password.
///
/// # Errors
///
/// [`IdentityError::EmailTaken`] if the email (case-insensitive) exists.
pub fn create_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, IdentityError> {
    let inserted = conn.execute(
        "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
        params![username, email, password_hash],
    );

    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(IdentityError::EmailTaken);
        }
        Err(e) => return Err(e.into()),
    }

    get_user_by_email(conn, email)?.ok_or(IdentityError::Database(
        rusqlite::Error::QueryReturnedNoRows,
    ))
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, IdentityError> {
    let user = conn
        .query_row(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE email = ?1",
            [email],
            User::from_row,
        )
        .optional()?;
    Ok(user)
}

/// Shallow syntactic check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
pub fn validate_email(email: &str) -> Result<(), IdentityError> {
    let invalid = IdentityError::InvalidField {
        field: "email",
        reason: "not a valid email address",
    };

    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return Err(invalid);
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(invalid);
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid);
    }
    Ok(())
}
