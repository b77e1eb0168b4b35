//! Retired bulk-save entry points from the era before guild partitioning.
//!
//! These wrote whole datasets in one sweep with no guild scoping, which is
//! how state used to bleed between guilds. They fail before touching the
//! pool so a stale caller surfaces immediately instead of writing through
//! a path that ignores partitions. Payloads stay loosely typed the way the
//! old callers produced them.

use serde_json::Value;

use crate::db::StateStore;
use crate::error::HorreumError;

impl StateStore {
    /// Always fails: per-user chi writes go through `update_user_chi` or
    /// `upsert_user`.
    pub async fn save_all_user_data(&self, _chi_data: &Value) -> Result<(), HorreumError> {
        Err(HorreumError::LegacyPath("save_all_user_data"))
    }

    /// Always fails: team writes go through `create_team` and the per-team
    /// writers.
    pub async fn save_all_teams_data(&self, _team_data: &Value) -> Result<(), HorreumError> {
        Err(HorreumError::LegacyPath("save_all_teams_data"))
    }

    /// Always fails: garden writes go through `save_garden`.
    pub async fn save_all_gardens_data(&self, _garden_data: &Value) -> Result<(), HorreumError> {
        Err(HorreumError::LegacyPath("save_all_gardens_data"))
    }

    /// Always fails: there is no whole-dataset sync anymore.
    pub async fn sync_all_data(
        &self,
        _chi_data: &Value,
        _team_data: &Value,
        _garden_data: &Value,
    ) -> Result<(), HorreumError> {
        Err(HorreumError::LegacyPath("sync_all_data"))
    }
}
