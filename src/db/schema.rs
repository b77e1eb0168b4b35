//! SQL DDL for initializing the database schema.
//! One script shared by both backends, so column types stay on the
//! BIGINT/TEXT subset both dialects (and the runtime-generic driver)
//! agree on: timestamps are epoch seconds, flags are 0/1, and list
//! columns hold JSON arrays.

use sqlx::AnyPool;

use crate::db::dialect::Dialect;
use crate::error::HorreumError;

/// Schema includes:
/// - `users` plus per-user `inventories`, `artifacts`, `pets` (one partition
///   per guild, keyed `(guild_id, user_id, ...)`)
/// - `teams` and its child tables (members, modules, decorations, equipment,
///   relations), keyed `(guild_id, team_id, ...)`
/// - `gardens` with `garden_plants` (heap rows; `harvested` is one-way) and
///   `garden_watering`
/// - `server_configs`, one row per guild
pub const SCHEMA_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Users (one row per user per guild partition)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    user_id BIGINT NOT NULL,
    guild_id BIGINT NOT NULL,
    chi BIGINT NOT NULL DEFAULT 0,
    rebirths BIGINT NOT NULL DEFAULT 0,
    milestones_claimed TEXT NOT NULL DEFAULT '[]', -- JSON array of names
    mini_quests TEXT NOT NULL DEFAULT '[]', -- JSON array of names
    active_pet TEXT NULL,
    created_at BIGINT NOT NULL, -- epoch seconds
    updated_at BIGINT NOT NULL, -- epoch seconds
    PRIMARY KEY (guild_id, user_id)
);

-- ---------------------------------------------------------------------------
-- Inventories (quantities merge-add, item_level keeps its high-water mark)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS inventories (
    user_id BIGINT NOT NULL,
    guild_id BIGINT NOT NULL,
    item_name TEXT NOT NULL,
    quantity BIGINT NOT NULL DEFAULT 0,
    item_level BIGINT NOT NULL DEFAULT 1,
    PRIMARY KEY (guild_id, user_id, item_name)
);

-- ---------------------------------------------------------------------------
-- Artifacts (globally unique id, immutable once created)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS artifacts (
    artifact_id TEXT PRIMARY KEY NOT NULL,
    user_id BIGINT NOT NULL,
    guild_id BIGINT NOT NULL,
    tier TEXT NOT NULL,
    emoji TEXT NOT NULL,
    name TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_artifacts_owner ON artifacts(guild_id, user_id);

-- ---------------------------------------------------------------------------
-- Pets (id is "{user_id}_{pet_id}", one row per species per owner)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS pets (
    id TEXT PRIMARY KEY NOT NULL,
    user_id BIGINT NOT NULL,
    guild_id BIGINT NOT NULL,
    pet_id TEXT NOT NULL,
    name TEXT NOT NULL,
    nickname TEXT NULL,
    health BIGINT NOT NULL DEFAULT 100,
    max_health BIGINT NOT NULL DEFAULT 100,
    attack BIGINT NOT NULL DEFAULT 25,
    hunger BIGINT NOT NULL DEFAULT 100
);

CREATE INDEX IF NOT EXISTS idx_pets_owner ON pets(guild_id, user_id);

-- ---------------------------------------------------------------------------
-- Teams (guild-scoped aggregate root)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS teams (
    guild_id BIGINT NOT NULL,
    team_id BIGINT NOT NULL,
    name TEXT NOT NULL,
    leader_id BIGINT NOT NULL,
    base_tier TEXT NOT NULL DEFAULT 'solo',
    base_color TEXT NOT NULL DEFAULT 'white',
    gym_level BIGINT NOT NULL DEFAULT 1,
    arena_level BIGINT NOT NULL DEFAULT 1,
    team_chi BIGINT NOT NULL DEFAULT 0,
    team_score BIGINT NOT NULL DEFAULT 0,
    wins BIGINT NOT NULL DEFAULT 0,
    losses BIGINT NOT NULL DEFAULT 0,
    ties BIGINT NOT NULL DEFAULT 0,
    created_at BIGINT NOT NULL, -- epoch seconds
    updated_at BIGINT NOT NULL, -- epoch seconds
    PRIMARY KEY (guild_id, team_id)
);

CREATE TABLE IF NOT EXISTS team_members (
    guild_id BIGINT NOT NULL,
    team_id BIGINT NOT NULL,
    user_id BIGINT NOT NULL,
    PRIMARY KEY (guild_id, team_id, user_id)
);

CREATE TABLE IF NOT EXISTS team_modules (
    guild_id BIGINT NOT NULL,
    team_id BIGINT NOT NULL,
    module_name TEXT NOT NULL,
    level BIGINT NOT NULL DEFAULT 1,
    PRIMARY KEY (guild_id, team_id, module_name)
);

CREATE TABLE IF NOT EXISTS team_decorations (
    guild_id BIGINT NOT NULL,
    team_id BIGINT NOT NULL,
    decoration_name TEXT NOT NULL,
    PRIMARY KEY (guild_id, team_id, decoration_name)
);

CREATE TABLE IF NOT EXISTS team_equipment (
    guild_id BIGINT NOT NULL,
    team_id BIGINT NOT NULL,
    equipment_name TEXT NOT NULL,
    PRIMARY KEY (guild_id, team_id, equipment_name)
);

CREATE TABLE IF NOT EXISTS team_relations (
    guild_id BIGINT NOT NULL,
    team_id BIGINT NOT NULL,
    related_team_id BIGINT NOT NULL,
    relation_type TEXT NOT NULL, -- 'ally' or 'enemy'
    PRIMARY KEY (guild_id, team_id, related_team_id, relation_type)
);

-- ---------------------------------------------------------------------------
-- Gardens (per-user aggregate; plants are heap rows, harvest is one-way)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS gardens (
    user_id BIGINT NOT NULL,
    guild_id BIGINT NOT NULL,
    tier TEXT NOT NULL DEFAULT 'basic',
    level BIGINT NOT NULL DEFAULT 1,
    created_at BIGINT NOT NULL, -- epoch seconds
    updated_at BIGINT NOT NULL, -- epoch seconds
    PRIMARY KEY (guild_id, user_id)
);

CREATE TABLE IF NOT EXISTS garden_plants (
    user_id BIGINT NOT NULL,
    guild_id BIGINT NOT NULL,
    plant_name TEXT NOT NULL,
    planted_at BIGINT NOT NULL, -- epoch seconds
    harvested BIGINT NOT NULL DEFAULT 0 -- 0/1 flag
);

CREATE INDEX IF NOT EXISTS idx_garden_plants_owner ON garden_plants(guild_id, user_id, harvested);

CREATE TABLE IF NOT EXISTS garden_watering (
    user_id BIGINT NOT NULL,
    guild_id BIGINT NOT NULL,
    plant_name TEXT NOT NULL,
    last_watered BIGINT NOT NULL, -- epoch seconds
    PRIMARY KEY (guild_id, user_id, plant_name)
);

-- ---------------------------------------------------------------------------
-- Server configuration (one row per guild)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS server_configs (
    guild_id BIGINT NOT NULL,
    admin_role_id BIGINT NULL,
    log_channel_id BIGINT NULL,
    garden_channels TEXT NOT NULL DEFAULT '[]', -- JSON array of channel ids
    duel_channels TEXT NOT NULL DEFAULT '[]', -- JSON array of channel ids
    pet_channels TEXT NOT NULL DEFAULT '[]', -- JSON array of channel ids
    world_channels TEXT NOT NULL DEFAULT '[]', -- JSON array of channel ids
    world_roles TEXT NOT NULL DEFAULT '[]', -- JSON array of role ids
    setup_complete BIGINT NOT NULL DEFAULT 0, -- 0/1 flag
    created_at BIGINT NOT NULL, -- epoch seconds
    updated_at BIGINT NOT NULL, -- epoch seconds
    PRIMARY KEY (guild_id)
);
"#;

/// Applies the schema; every statement is `IF NOT EXISTS`, so this is safe
/// to run on each startup. The embedded backend takes the script whole;
/// the networked backend runs the statements one at a time.
pub async fn init_schema(pool: &AnyPool, dialect: Dialect) -> Result<(), HorreumError> {
    match dialect {
        Dialect::Sqlite => {
            sqlx::raw_sql(SCHEMA_INIT).execute(pool).await?;
        }
        Dialect::Postgres => {
            for stmt in SCHEMA_INIT.split(';') {
                let sql = stmt.trim();
                if sql.is_empty() {
                    continue;
                }
                sqlx::query(sql).execute(pool).await?;
            }
        }
    }
    Ok(())
}
