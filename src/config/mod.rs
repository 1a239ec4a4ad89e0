//! Application configuration loaded from environment.

use std::net::SocketAddr;

const MIN_JWT_SECRET_LEN: usize = 32;
/// One year.
const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

/// Application configuration loaded from `.env` and environment variables.
///
/// Built once in `main` and handed to the components that need it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g. `0.0.0.0:8000`).
    pub server_addr: SocketAddr,
    /// SQLite connection URL (e.g. `sqlite://asset_tracker.db`).
    pub database_url: String,
    /// JWT signing secret (min 32 chars).
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    pub token_ttl_minutes: i64,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
    /// Admin account created at startup when absent.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let server_addr: SocketAddr = server_addr
            .parse()
            .map_err(|_| ConfigLoadError::InvalidServerAddr)?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://asset_tracker.db".to_string());

        let jwt_secret = lookup("JWT_SECRET")
            .unwrap_or_else(|| "asset_tracker_jwt_secret_change_in_production".to_string());
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigLoadError::WeakJwtSecret(MIN_JWT_SECRET_LEN));
        }

        let token_ttl_minutes = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|m| (1..=MAX_TOKEN_TTL_MINUTES).contains(m))
                .ok_or(ConfigLoadError::InvalidTokenTtl)?,
            None => 30,
        };

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let bootstrap_admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => {
                let email =
                    lookup("ADMIN_EMAIL").unwrap_or_else(|| format!("{}@localhost.localdomain", username));
                Some(BootstrapAdmin {
                    username,
                    email,
                    password,
                })
            }
            _ => None,
        };

        Ok(Self {
            server_addr,
            database_url,
            jwt_secret,
            token_ttl_minutes,
            log_level,
            bootstrap_admin,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Invalid SERVER_ADDR")]
    InvalidServerAddr,
    #[error("ACCESS_TOKEN_EXPIRE_MINUTES must be between 1 and 525600 (one year)")]
    InvalidTokenTtl,
    #[error("JWT_SECRET must be at least {0} characters")]
    WeakJwtSecret(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigLoadError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.server_addr.port(), 8000);
        assert_eq!(cfg.token_ttl_minutes, 30);
        assert_eq!(cfg.database_url, "sqlite://asset_tracker.db");
        assert!(cfg.bootstrap_admin.is_none());
    }

    #[test]
    fn rejects_short_secret() {
        assert!(matches!(
            load(&[("JWT_SECRET", "short")]),
            Err(ConfigLoadError::WeakJwtSecret(_))
        ));
    }

    #[test]
    fn rejects_non_positive_ttl() {
        assert!(matches!(
            load(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "0")]),
            Err(ConfigLoadError::InvalidTokenTtl)
        ));
        assert!(matches!(
            load(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "abc")]),
            Err(ConfigLoadError::InvalidTokenTtl)
        ));
    }

    #[test]
    fn rejects_ttl_beyond_a_year() {
        let max = MAX_TOKEN_TTL_MINUTES.to_string();
        assert_eq!(
            load(&[("ACCESS_TOKEN_EXPIRE_MINUTES", &max)]).unwrap().token_ttl_minutes,
            MAX_TOKEN_TTL_MINUTES
        );
        let over = (MAX_TOKEN_TTL_MINUTES + 1).to_string();
        let huge = i64::MAX.to_string();
        for raw in [over.as_str(), huge.as_str()] {
            assert!(matches!(
                load(&[("ACCESS_TOKEN_EXPIRE_MINUTES", raw)]),
                Err(ConfigLoadError::InvalidTokenTtl)
            ));
        }
    }

    #[test]
    fn bootstrap_admin_needs_username_and_password() {
        let cfg = load(&[("ADMIN_USERNAME", "root")]).unwrap();
        assert!(cfg.bootstrap_admin.is_none());

        let cfg = load(&[("ADMIN_USERNAME", "root"), ("ADMIN_PASSWORD", "changeme123")]).unwrap();
        let admin = cfg.bootstrap_admin.unwrap();
        assert_eq!(admin.username, "root");
        assert_eq!(admin.email, "root@localhost.localdomain");
    }
}
