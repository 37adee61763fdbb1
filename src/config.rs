use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::crypto::PBKDF2_ITERATIONS;

/// Application-level constants
pub const APP_NAME: &str = "MedAppoint";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Upper bound for `MEDAPPOINT_TOKEN_TTL_HOURS` (ten years).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medappoint=info,tower_http=warn"
}

/// Get the application data directory (`<platform data dir>/MedAppoint`).
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_NAME))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Cannot determine a data directory; set MEDAPPOINT_DATABASE")]
    NoDataDir,

    #[error("{0} is set but {1} is missing")]
    Incomplete(&'static str, &'static str),
}

/// OAuth client registration for Google sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Credentials for an administrator created at startup if absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: SocketAddr,
    pub database_path: PathBuf,
    pub password_rounds: u32,
    /// `None` means tokens never expire.
    pub token_ttl_hours: Option<i64>,
    pub admin: Option<AdminSeed>,
    pub google: Option<GoogleSettings>,
    /// Where the federated callback sends the browser with `#<token>`.
    pub frontend_url: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (the process env in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("MEDAPPOINT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "MEDAPPOINT_BIND",
                value: bind_raw.clone(),
            })?;

        let database_path = match get("MEDAPPOINT_DATABASE") {
            Some(path) => PathBuf::from(path),
            None => app_data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("medappoint.db"),
        };

        let password_rounds = match get("MEDAPPOINT_PASSWORD_ROUNDS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MEDAPPOINT_PASSWORD_ROUNDS",
                        value: raw,
                    })
                }
            },
            None => PBKDF2_ITERATIONS,
        };

        let token_ttl_hours = match get("MEDAPPOINT_TOKEN_TTL_HOURS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n > 0 && n <= MAX_TOKEN_TTL_HOURS => Some(n),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MEDAPPOINT_TOKEN_TTL_HOURS",
                        value: raw,
                    })
                }
            },
            None => None,
        };

        let admin = match (get("MEDAPPOINT_ADMIN_EMAIL"), get("MEDAPPOINT_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (Some(_), None) => {
                return Err(ConfigError::Incomplete(
                    "MEDAPPOINT_ADMIN_EMAIL",
                    "MEDAPPOINT_ADMIN_PASSWORD",
                ))
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete(
                    "MEDAPPOINT_ADMIN_PASSWORD",
                    "MEDAPPOINT_ADMIN_EMAIL",
                ))
            }
            (None, None) => None,
        };

        let google = match get("GOOGLE_CLIENT_ID") {
            Some(client_id) => Some(GoogleSettings {
                client_id,
                client_secret: get("GOOGLE_CLIENT_SECRET")
                    .ok_or(ConfigError::Incomplete("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"))?,
                redirect_uri: get("GOOGLE_REDIRECT_URI")
                    .ok_or(ConfigError::Incomplete("GOOGLE_CLIENT_ID", "GOOGLE_REDIRECT_URI"))?,
            }),
            None => None,
        };

        Ok(Self {
            bind,
            database_path,
            password_rounds,
            token_ttl_hours,
            admin,
            google,
            frontend_url: get("MEDAPPOINT_FRONTEND_URL").unwrap_or_else(|| "/".to_string()),
        })
    }
}
