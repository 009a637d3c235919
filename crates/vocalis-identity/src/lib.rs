//! Accounts and bearer-token sessions for Vocalis.
//!
//! Users register with an email and password (stored as a bcrypt hash) and
//! log in to receive a short-lived signed token whose `sub` claim is their
//! email. Protected requests present that token; [`authenticate`] decodes
//! it and resolves the subject through a [`UserDirectory`].
//!
//! Tokens are stateless. Nothing is recorded server-side at login, and the
//! only thing a verifier learns from storage is whether the subject still
//! exists.

mod password;
mod token;
mod users;

pub use password::{
    hash_password, verify_password, verify_unknown_account, DEFAULT_COST, MIN_COST,
};
pub use token::{decode_token, issue_token, issue_token_at, Claims, TokenSettings};
pub use users::{
    create_user, get_user_by_email, validate_email, SqliteUserDirectory, User, UserDirectory,
};

use rusqlite::Connection;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a bearer token was refused.
///
/// Callers must not reveal this to clients; every variant is surfaced as
/// the same unauthenticated response. It exists for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    Malformed,
    BadSignature,
    Expired,
    MissingSubject,
    UnknownUser,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("could not validate credentials")]
    Unauthenticated(AuthFailure),

    #[error("incorrect email or password")]
    InvalidLogin,

    #[error("a user with this email already exists")]
    EmailTaken,

    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token lifetime out of range: {0:?}")]
    LifetimeOutOfRange(Duration),

    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl IdentityError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }
}

/// Resolves a bearer token to the user it was issued for.
///
/// # Errors
///
/// Returns [`IdentityError::Unauthenticated`] when the token is malformed,
/// badly signed, expired, has no `sub`, or names a user that no longer
/// exists. Storage failures in the directory propagate unchanged.
pub fn authenticate(
    token: &str,
    settings: &TokenSettings,
    directory: &dyn UserDirectory,
) -> Result<User, IdentityError> {
    let claims = decode_token(token, settings)?;

    let email = claims
        .get("sub")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(IdentityError::Unauthenticated(AuthFailure::MissingSubject))?;

    directory
        .find_by_email(email)?
        .ok_or(IdentityError::Unauthenticated(AuthFailure::UnknownUser))
}

/// Input for [`register`].
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Validates and stores a new account.
///
/// # Errors
///
/// [`IdentityError::InvalidField`] for blank fields or a malformed email,
/// [`IdentityError::EmailTaken`] if the address is already registered.
pub fn register(conn: &Connection, new_user: NewUser<'_>, cost: u32) -> Result<User, IdentityError> {
    let username = new_user.username.trim();
    if username.is_empty() {
        return Err(IdentityError::InvalidField {
            field: "username",
            reason: "must not be empty",
        });
    }
    validate_email(new_user.email)?;
    if new_user.password.is_empty() {
        return Err(IdentityError::InvalidField {
            field: "password",
            reason: "must not be empty",
        });
    }

    if get_user_by_email(conn, new_user.email)?.is_some() {
        return Err(IdentityError::EmailTaken);
    }

    let hash = hash_password(new_user.password, cost)?;
    let user = create_user(conn, username, new_user.email.trim(), &hash)?;
    tracing::info!(user_id = user.id, "registered user");
    Ok(user)
}

/// What a successful login hands back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct LoginGrant {
    pub access_token: String,
    pub token_type: &'static str,
    pub username: String,
    pub email: String,
}

/// Checks a password and issues an access token whose `sub` is the email.
///
/// # Errors
///
/// [`IdentityError::InvalidLogin`] for an unknown email or wrong password;
/// the two are indistinguishable to the caller. `cost` is the bcrypt cost
/// accounts are registered with; an unknown email is checked against a
/// dummy hash at that cost so both failures take the same time.
pub fn login(
    conn: &Connection,
    email: &str,
    password: &str,
    settings: &TokenSettings,
    lifetime: Option<Duration>,
    cost: u32,
) -> Result<LoginGrant, IdentityError> {
    let Some(user) = get_user_by_email(conn, email.trim())? else {
        verify_unknown_account(password, cost);
        return Err(IdentityError::InvalidLogin);
    };

    if !verify_password(password, &user.password_hash) {
        return Err(IdentityError::InvalidLogin);
    }

    let mut claims = Claims::new();
    claims.insert("sub".to_string(), user.email.clone().into());
    let access_token = issue_token(claims, lifetime, settings)?;

    Ok(LoginGrant {
        access_token,
        token_type: "bearer",
        username: user.username,
        email: user.email,
    })
}
