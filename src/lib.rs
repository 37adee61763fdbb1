pub mod accounts;
pub mod api;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod federated;
pub mod models;
pub mod validation;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, Settings};
use crate::core_state::{CoreError, CoreState};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Core(#[from] CoreError),
    #[error("Admin bootstrap failed: {0}")]
    Admin(#[from] accounts::AccountError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Read settings from the environment, prepare the database and serve
/// until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = Settings::from_env()?;
    let core = Arc::new(CoreState::from_settings(&settings));

    // Migrations run here, before the first request.
    let conn = core.open_db()?;
    if let Some(seed) = &settings.admin {
        let admin_id = accounts::bootstrap_admin(&conn, &core, seed)?;
        tracing::info!(user_id = admin_id, "Admin account ready");
    }
    drop(conn);

    tracing::info!(
        database = %settings.database_path.display(),
        federated = core.identity_provider().is_some(),
        "Configuration loaded"
    );

    api::serve_until_ctrl_c(core, settings.bind).await?;
    Ok(())
}
