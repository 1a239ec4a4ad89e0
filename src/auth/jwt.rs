//! Bearer token issue, validation and role checks.

use crate::db::UserRow;
use crate::error::{AppError, AppResult};
use crate::models::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| AppError::Jwt(e.to_string()))
    }
}

/// Signs and checks HS256 tokens with the server-held secret.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    ttl: Duration,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: i64) -> AppResult<Self> {
        let ttl = Duration::try_minutes(ttl_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| AppError::Config(format!("token lifetime out of range: {ttl_minutes} minutes")))?;
        Ok(Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &UserRow) -> AppResult<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Config("token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::default(), claims, &self.keys.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("sign token: {}", e)))
    }

    pub fn validate(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.keys.decoding, &validation).map_err(|e| {
            debug!(error = %e, "token rejected");
            AppError::Jwt(e.to_string())
        })?;
        Ok(data.claims)
    }

    /// Validate `token`, then require its role to reach `required`.
    pub fn authorize(&self, token: &str, required: Role) -> AppResult<Claims> {
        let claims = self.validate(token)?;
        if !claims.role.satisfies(required) {
            debug!(role = %claims.role, required = %required, "insufficient role");
            return Err(AppError::Forbidden("Not enough permissions".to_string()));
        }
        Ok(claims)
    }
}
