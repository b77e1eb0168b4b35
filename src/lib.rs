//! Guild-partitioned persistent state store shared by the game-bot family.
//!
//! One `StateStore` handle fronts either an embedded SQLite file or a
//! networked PostgreSQL pool, selected at connect time by the presence of
//! `database_url` in [`config::StoreConfig`]. Every per-user operation
//! resolves its guild partition through [`db::resolve_partition`], which is
//! what keeps one guild's game state invisible to every other guild.

pub mod config;
pub mod db;
pub mod error;

pub use config::StoreConfig;
pub use db::{
    Artifact, ArtifactCreate, DuelStats, Garden, GardenPlant, GuildMember, InventoryItem, Pet,
    PetUpsert, ServerConfig, ServerConfigPatch, StateStore, Team, TeamCreate, TeamRelationKind,
    User, UserUpsert,
};
pub use db::{GLOBAL_GUILD_ID, SUPER_ADMIN_USER_ID, resolve_partition};
pub use error::{HorreumError, IsRetryable};
