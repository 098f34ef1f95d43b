use std::sync::Arc;

use crate::auth::hash_password;
use crate::config::{AppConfig, StoreBackend};
use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, DatabaseManager, MemoryStore, PgStore, Store};

/// Shared handler state: the persistence gateway plus configuration
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Builds the store selected by `database.backend`, migrating PostgreSQL if enabled.
    pub async fn from_config(config: AppConfig) -> Result<Self, DatabaseError> {
        let store: Arc<dyn Store> = match config.database.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                if config.database.run_migrations {
                    DatabaseManager::migrate(&pool).await?;
                }
                Arc::new(PgStore::new(pool))
            }
        };

        Ok(Self::new(store, Arc::new(config)))
    }

    /// Creates the configured bootstrap admin unless that username already exists.
    pub async fn bootstrap_admin(&self) -> anyhow::Result<()> {
        let Some(admin) = self.config.security.bootstrap_admin.clone() else {
            return Ok(());
        };

        match create_admin(self.store.as_ref(), &admin.username, &admin.password).await? {
            Some(user) => tracing::info!(user_id = %user.id, "Created bootstrap admin '{}'", user.username),
            None => tracing::debug!("Bootstrap admin '{}' already exists", admin.username),
        }
        Ok(())
    }
}

/// Inserts an admin account. `None` when the username is taken.
pub async fn create_admin(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> anyhow::Result<Option<User>> {
    let user = store
        .insert_user_if_absent(NewUser {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            admin: true,
        })
        .await?;
    Ok(user)
}
