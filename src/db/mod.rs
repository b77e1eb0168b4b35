//! Database module: the guild-partitioned state store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and aggregates
//! - `patch.rs`: create/upsert/patch payloads for the repositories
//! - `schema.rs`: SQL DDL for initializing the database (both backends)
//! - `dialect.rs`: placeholder and function differences between backends
//! - `partition.rs`: guild partition resolution
//! - per-domain repositories: `users`, `inventories`, `artifacts`, `pets`,
//!   `teams`, `gardens`, `server_config`
//! - `cascade.rs`: transactional whole-guild deletion
//! - `legacy.rs`: retired bulk-save entry points

pub mod dialect;
pub mod models;
pub mod partition;
pub mod patch;
pub mod schema;

mod artifacts;
mod cascade;
mod gardens;
mod inventories;
mod legacy;
mod pets;
mod server_config;
mod teams;
mod users;

pub use dialect::Dialect;
pub use models::{
    Artifact, DuelStats, Garden, GardenPlant, GuildMember, InventoryItem, Pet, ServerConfig, Team,
    TeamRelationKind, User,
};
pub use partition::{GLOBAL_GUILD_ID, SUPER_ADMIN_USER_ID, resolve_partition};
pub use patch::{ArtifactCreate, PetUpsert, ServerConfigPatch, TeamCreate, UserUpsert};
pub use schema::SCHEMA_INIT;

use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool};
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::config::StoreConfig;
use crate::error::HorreumError;

/// Connections the networked pool keeps warm.
const POOL_MIN_CONNECTIONS: u32 = 2;
/// Upper bound on concurrent connections for the networked pool.
const POOL_MAX_CONNECTIONS: u32 = 10;
/// How long an operation may wait for a connection before giving up.
const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(60);

/// Handle to the guild-partitioned state store. Cheap to clone; all clones
/// share one pool.
#[derive(Debug, Clone)]
pub struct StateStore {
    pool: AnyPool,
    dialect: Dialect,
}

impl StateStore {
    /// Connects to the backend selected by `config` and applies the schema.
    ///
    /// A configured `database_url` selects the networked PostgreSQL
    /// backend; otherwise the store opens the embedded file at
    /// `database_path`, creating it (and its parent directories) on first
    /// use.
    pub async fn connect(config: &StoreConfig) -> Result<Self, HorreumError> {
        install_default_drivers();

        let store = match &config.database_url {
            Some(raw) => {
                let url = Url::parse(raw).map_err(|e| {
                    HorreumError::ConfigurationError(format!("invalid database_url: {e}"))
                })?;
                if !matches!(url.scheme(), "postgres" | "postgresql") {
                    return Err(HorreumError::ConfigurationError(format!(
                        "unsupported database_url scheme `{}`; expected postgres:// or postgresql://",
                        url.scheme()
                    )));
                }

                let pool = AnyPoolOptions::new()
                    .min_connections(POOL_MIN_CONNECTIONS)
                    .max_connections(POOL_MAX_CONNECTIONS)
                    .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
                    .connect(raw)
                    .await?;

                Self {
                    pool,
                    dialect: Dialect::Postgres,
                }
            }
            None => {
                if let Some(parent) = config.database_path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let url = format!("sqlite:{}?mode=rwc", config.database_path.display());

                // One connection: the embedded file gets a single shared
                // handle and concurrent writers queue on it.
                let pool = AnyPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
                    .connect(&url)
                    .await?;

                Self {
                    pool,
                    dialect: Dialect::Sqlite,
                }
            }
        };

        schema::init_schema(&store.pool, store.dialect).await?;
        info!(
            backend = store.dialect.name(),
            "state store connected and schema applied"
        );

        Ok(store)
    }

    /// Closes the pool. Safe to call more than once; in-flight operations
    /// finish before their connections drop.
    pub async fn disconnect(&self) {
        self.pool.close().await;
    }

    /// Checks a connection out of the pool. It returns to the pool when the
    /// guard drops, on every exit path.
    pub async fn acquire(&self) -> Result<PoolConnection<Any>, HorreumError> {
        Ok(self.pool.acquire().await?)
    }

    /// Dialect of the connected backend.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}
