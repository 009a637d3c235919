//! bcrypt password hashing.

use crate::IdentityError;

pub use bcrypt::DEFAULT_COST;

/// Lowest cost bcrypt accepts. Only suitable for tests.
pub const MIN_COST: u32 = 4;

pub fn hash_password(password: &str, cost: u32) -> Result<String, IdentityError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Salt and digest of a throwaway bcrypt hash. No password maps to it in
/// practice; it only gives [`verify_unknown_account`] real work to do.
const DUMMY_HASH_BODY: &str = "R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

fn dummy_hash(cost: u32) -> String {
    format!("$2b${cost:02}${DUMMY_HASH_BODY}")
}

/// Runs one bcrypt verification at `cost` and always fails.
///
/// Used when the account does not exist, so rejecting an unknown email
/// costs the same as rejecting a wrong password.
pub fn verify_unknown_account(password: &str, cost: u32) -> bool {
    let _ = bcrypt::verify(password, &dummy_hash(cost));
    false
}

/// Returns `false` for a mismatch and for an unreadable stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash could not be checked");
            false
        }
    }
}
