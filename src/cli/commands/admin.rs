use anyhow::bail;
use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::{config, StoreBackend};
use crate::database::DatabaseManager;
use crate::state::{create_admin as insert_admin, AppState};

/// Applies the embedded schema to the configured PostgreSQL database.
pub async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    if config.database.backend != StoreBackend::Postgres {
        bail!("migrate requires STORE_BACKEND=postgres");
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;

    output_success(&output_format, "Schema applied", None)
}

pub async fn create_admin(username: &str, password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config().clone();
    if config.database.backend == StoreBackend::Memory {
        tracing::warn!("Memory backend selected; the account will not outlive this process");
    }

    let state = AppState::from_config(config).await?;
    match insert_admin(state.store.as_ref(), username, password).await? {
        Some(user) => output_success(
            &output_format,
            &format!("Admin '{}' created", user.username),
            Some(json!({ "id": user.id })),
        ),
        None => {
            output_error(&output_format, &format!("User '{}' already exists", username))?;
            bail!("user '{}' already exists", username)
        }
    }
}
