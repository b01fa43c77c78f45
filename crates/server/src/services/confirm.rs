//! Delete-confirmation tokens.
//!
//! A confirmation page hands out a short-lived HS256 token bound to the user,
//! the action and the object id. The destructive POST only proceeds when it
//! echoes back a token that still verifies for exactly that triple.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{AppError, Result},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmAction {
    DeleteProject,
    DeleteTask,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfirmClaims {
    sub: String,
    action: ConfirmAction,
    object: String,
    exp: usize,
}

pub fn issue(
    config: &Config,
    user_id: &str,
    action: ConfirmAction,
    object_id: &str,
) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(config.confirm_ttl)
        .ok_or_else(|| AppError::Internal("Confirmation expiry out of range".to_string()))?
        .timestamp()
        .max(0) as usize;

    let claims = ConfirmClaims {
        sub: user_id.to_string(),
        action,
        object: object_id.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|_| AppError::Internal("Failed to create confirmation token".to_string()))
}

pub fn verify(
    config: &Config,
    token: &str,
    user_id: &str,
    action: ConfirmAction,
    object_id: &str,
) -> bool {
    match decode::<ConfirmClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => {
            let claims = data.claims;
            claims.sub == user_id && claims.action == action && claims.object == object_id
        }
        Err(err) => {
            tracing::debug!(error = %err, "Rejected confirmation token");
            false
        }
    }
}
