use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};
use std::collections::HashMap;

/// Per-guild player record. Milestones and mini-quests are one-way sets:
/// writes merge into them, nothing removes an entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub user_id: i64,
    pub guild_id: i64,
    pub chi: i64,
    pub rebirths: i64,
    pub milestones_claimed: Vec<String>,
    pub mini_quests: Vec<String>,
    pub active_pet: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, AnyRow> for User {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            guild_id: row.try_get("guild_id")?,
            chi: row.try_get("chi")?,
            rebirths: row.try_get("rebirths")?,
            milestones_claimed: decode_name_list(row, "milestones_claimed")?,
            mini_quests: decode_name_list(row, "mini_quests")?,
            active_pet: row.try_get("active_pet")?,
            created_at: decode_epoch(row, "created_at")?,
            updated_at: decode_epoch(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct InventoryItem {
    pub user_id: i64,
    pub guild_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub item_level: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Artifact {
    pub artifact_id: String,
    pub user_id: i64,
    pub guild_id: i64,
    pub tier: String,
    pub emoji: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Pet {
    /// Row key, always `"{user_id}_{pet_id}"`.
    pub id: String,
    pub user_id: i64,
    pub guild_id: i64,
    pub pet_id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub health: i64,
    pub max_health: i64,
    pub attack: i64,
    pub hunger: i64,
}

/// Team aggregate: the base row plus every child table, assembled by
/// `StateStore::get_team`. A child query failing fails the whole read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub team_id: i64,
    pub guild_id: i64,
    pub name: String,
    pub leader_id: i64,
    pub base_tier: String,
    pub base_color: String,
    pub gym_level: i64,
    pub arena_level: i64,
    pub team_chi: i64,
    pub team_score: i64,
    pub wins: i64,
    pub losses: i64,
    pub ties: i64,
    /// Member user ids, stringified the way the embed layer consumes them.
    pub members: Vec<String>,
    /// Module name to installed level.
    pub modules: HashMap<String, i64>,
    pub decorations: Vec<String>,
    pub equipment: Vec<String>,
    pub allies: Vec<i64>,
    pub enemies: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Duel record derived from the stored counters; never persisted on its
    /// own.
    pub fn duel_stats(&self) -> DuelStats {
        DuelStats {
            wins: self.wins,
            losses: self.losses,
            ties: self.ties,
        }
    }
}

// Decodes the base row only; child collections start empty and are filled
// by the aggregate read.
impl<'r> FromRow<'r, AnyRow> for Team {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            team_id: row.try_get("team_id")?,
            guild_id: row.try_get("guild_id")?,
            name: row.try_get("name")?,
            leader_id: row.try_get("leader_id")?,
            base_tier: row.try_get("base_tier")?,
            base_color: row.try_get("base_color")?,
            gym_level: row.try_get("gym_level")?,
            arena_level: row.try_get("arena_level")?,
            team_chi: row.try_get("team_chi")?,
            team_score: row.try_get("team_score")?,
            wins: row.try_get("wins")?,
            losses: row.try_get("losses")?,
            ties: row.try_get("ties")?,
            members: Vec::new(),
            modules: HashMap::new(),
            decorations: Vec::new(),
            equipment: Vec::new(),
            allies: Vec::new(),
            enemies: Vec::new(),
            created_at: decode_epoch(row, "created_at")?,
            updated_at: decode_epoch(row, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuelStats {
    pub wins: i64,
    pub losses: i64,
    pub ties: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRelationKind {
    Ally,
    Enemy,
}

impl TeamRelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TeamRelationKind::Ally => "ally",
            TeamRelationKind::Enemy => "enemy",
        }
    }
}

/// Garden aggregate: base row, the active (unharvested) plants, and the
/// watering map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Garden {
    pub user_id: i64,
    pub guild_id: i64,
    pub tier: String,
    pub level: i64,
    pub plants: Vec<GardenPlant>,
    /// Plant name to the moment it was last watered.
    pub last_watered: HashMap<String, DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GardenPlant {
    pub name: String,
    pub planted_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, AnyRow> for GardenPlant {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            name: row.try_get("plant_name")?,
            planted_at: decode_epoch(row, "planted_at")?,
        })
    }
}

/// Per-guild bot configuration. Channel and role lists are stored as JSON
/// id arrays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub guild_id: i64,
    pub admin_role_id: Option<i64>,
    pub log_channel_id: Option<i64>,
    pub garden_channels: Vec<i64>,
    pub duel_channels: Vec<i64>,
    pub pet_channels: Vec<i64>,
    pub world_channels: Vec<i64>,
    pub world_roles: Vec<i64>,
    pub setup_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, AnyRow> for ServerConfig {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            guild_id: row.try_get("guild_id")?,
            admin_role_id: row.try_get("admin_role_id")?,
            log_channel_id: row.try_get("log_channel_id")?,
            garden_channels: decode_id_list(row, "garden_channels")?,
            duel_channels: decode_id_list(row, "duel_channels")?,
            pet_channels: decode_id_list(row, "pet_channels")?,
            world_channels: decode_id_list(row, "world_channels")?,
            world_roles: decode_id_list(row, "world_roles")?,
            setup_complete: row.try_get::<i64, _>("setup_complete")? != 0,
            created_at: decode_epoch(row, "created_at")?,
            updated_at: decode_epoch(row, "updated_at")?,
        })
    }
}

/// The slice of a platform guild member the admin check needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuildMember {
    pub user_id: i64,
    pub role_ids: Vec<i64>,
    /// Platform-level Administrator permission flag.
    pub is_administrator: bool,
}

fn decode_name_list(row: &AnyRow, column: &str) -> Result<Vec<String>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn decode_id_list(row: &AnyRow, column: &str) -> Result<Vec<i64>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn decode_epoch(row: &AnyRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let secs: i64 = row.try_get(column)?;
    Ok(epoch_to_datetime(secs))
}

/// Converts stored epoch seconds back to the API's `DateTime<Utc>`;
/// out-of-range values clamp to the epoch.
pub(crate) fn epoch_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Current time as the epoch seconds the schema stores.
pub(crate) fn now_epoch() -> i64 {
    Utc::now().timestamp()
}
