use serde::{Deserialize, Serialize};

/// Write payload for `StateStore::upsert_user`.
///
/// Scalar fields follow patch semantics: `None` => do not change,
/// `Some(v)` => replace. The two set fields merge instead: entries are
/// added to what is stored and never removed, so replaying a stale payload
/// cannot strip progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpsert {
    pub chi: Option<i64>,
    pub rebirths: Option<i64>,
    /// Equipped pet id. `None` => do not change (clearing is not
    /// expressible through this payload).
    pub active_pet: Option<String>,
    /// Milestone names to merge into the claimed set.
    #[serde(default)]
    pub milestones_claimed: Vec<String>,
    /// Mini-quest names to merge into the completed set.
    #[serde(default)]
    pub mini_quests: Vec<String>,
}

/// Payload for `StateStore::add_artifact`. Artifacts are immutable;
/// inserting an id that already exists anywhere is a silent no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactCreate {
    pub artifact_id: String,
    pub tier: String,
    pub emoji: String,
    pub name: String,
}

/// Payload for `StateStore::add_pet`. The whole row is written: on
/// conflict, health, hunger, and nickname refresh from this payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetUpsert {
    pub pet_id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub health: i64,
    pub max_health: i64,
    pub attack: i64,
    pub hunger: i64,
}

impl PetUpsert {
    /// Fresh pet at spawn stats.
    pub fn new(pet_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pet_id: pet_id.into(),
            name: name.into(),
            nickname: None,
            health: 100,
            max_health: 100,
            attack: 25,
            hunger: 100,
        }
    }
}

/// Payload for `StateStore::create_team`. Tier, color, levels, and counters
/// start at the schema defaults; re-creating an existing team is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamCreate {
    pub team_id: i64,
    pub name: String,
    pub leader_id: i64,
}

/// Partial update for a guild's configuration. The field set is the closed
/// allow-list of what guild admins may change; `deny_unknown_fields` keeps
/// it closed for serde callers. `None` => do not change; `Some(v)` =>
/// replace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfigPatch {
    pub admin_role_id: Option<i64>,
    pub log_channel_id: Option<i64>,
    pub garden_channels: Option<Vec<i64>>,
    pub duel_channels: Option<Vec<i64>>,
    pub pet_channels: Option<Vec<i64>>,
    pub world_channels: Option<Vec<i64>>,
    pub world_roles: Option<Vec<i64>>,
    pub setup_complete: Option<bool>,
}

impl ServerConfigPatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.admin_role_id.is_none()
            && self.log_channel_id.is_none()
            && self.garden_channels.is_none()
            && self.duel_channels.is_none()
            && self.pet_channels.is_none()
            && self.world_channels.is_none()
            && self.world_roles.is_none()
            && self.setup_complete.is_none()
    }
}
