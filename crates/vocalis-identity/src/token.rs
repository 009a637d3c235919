//! Signed access tokens.

use crate::{AuthFailure, IdentityError};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Token payload: an arbitrary string-keyed map.
pub type Claims = serde_json::Map<String, Value>;

/// Lifetime used when the issuer is not given one explicitly.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(15 * 60);

/// Signing secret, algorithm, and default lifetime shared by issuer and
/// verifier. Loaded once at startup.
#[derive(Clone)]
pub struct TokenSettings {
    secret: Vec<u8>,
    algorithm: Algorithm,
    default_lifetime: Duration,
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("default_lifetime", &self.default_lifetime)
            .finish()
    }
}

impl TokenSettings {
    /// HS256 settings with the default 15 minute lifetime.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            default_lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }

    /// Builds settings from an algorithm name such as `"HS256"`.
    ///
    /// # Errors
    ///
    /// [`IdentityError::UnsupportedAlgorithm`] unless the name is one of the
    /// shared-secret HMAC algorithms.
    pub fn from_parts(
        secret: impl Into<Vec<u8>>,
        algorithm: &str,
        default_lifetime: Duration,
    ) -> Result<Self, IdentityError> {
        let algorithm = Algorithm::from_str(algorithm.trim())
            .map_err(|_| IdentityError::UnsupportedAlgorithm(algorithm.to_string()))?;
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(IdentityError::UnsupportedAlgorithm(format!("{algorithm:?}")));
        }

        Ok(Self {
            secret: secret.into(),
            algorithm,
            default_lifetime,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn default_lifetime(&self) -> Duration {
        self.default_lifetime
    }
}

/// Signs `claims` with `exp = now + lifetime`.
///
/// An existing `exp` in `claims` is overwritten. `lifetime` falls back to
/// the settings' default.
///
/// # Errors
///
/// [`IdentityError::LifetimeOutOfRange`] if the expiry does not fit a
/// 64-bit timestamp.
pub fn issue_token(
    claims: Claims,
    lifetime: Option<Duration>,
    settings: &TokenSettings,
) -> Result<String, IdentityError> {
    issue_token_at(claims, lifetime, SystemTime::now(), settings)
}

/// [`issue_token`] with an explicit clock reading.
pub fn issue_token_at(
    mut claims: Claims,
    lifetime: Option<Duration>,
    now: SystemTime,
    settings: &TokenSettings,
) -> Result<String, IdentityError> {
    let lifetime = lifetime.unwrap_or(settings.default_lifetime);
    let exp = i64::try_from(lifetime.as_secs())
        .ok()
        .and_then(|secs| unix_seconds(now).checked_add(secs))
        .ok_or(IdentityError::LifetimeOutOfRange(lifetime))?;
    claims.insert("exp".to_string(), Value::from(exp));

    let token = encode(
        &Header::new(settings.algorithm),
        &claims,
        &EncodingKey::from_secret(&settings.secret),
    )?;
    Ok(token)
}

/// Verifies signature and expiry and returns the claims.
///
/// Expiry is checked with zero leeway.
pub fn decode_token(token: &str, settings: &TokenSettings) -> Result<Claims, IdentityError> {
    let mut validation = Validation::new(settings.algorithm);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(&settings.secret),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        let failure = match e.kind() {
            ErrorKind::ExpiredSignature => AuthFailure::Expired,
            ErrorKind::InvalidSignature => AuthFailure::BadSignature,
            _ => AuthFailure::Malformed,
        };
        tracing::debug!(?failure, "rejected bearer token");
        IdentityError::Unauthenticated(failure)
    })
}

fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
