//! Per-guild configuration: admin role, log channel, feature channel lists,
//! and the setup flag.

use tracing::debug;

use crate::db::StateStore;
use crate::db::models::{GuildMember, ServerConfig, now_epoch};
use crate::db::patch::ServerConfigPatch;
use crate::error::HorreumError;

const SELECT_COLUMNS: &str = "guild_id, admin_role_id, log_channel_id, garden_channels, \
     duel_channels, pet_channels, world_channels, world_roles, setup_complete, created_at, updated_at";

// Owned bind value for the dynamically assembled upsert.
enum PatchBind {
    Int(i64),
    Text(String),
}

impl StateStore {
    /// A guild's configuration row, or `None` when the guild has never been
    /// configured.
    pub async fn get_server_config(
        &self,
        guild_id: i64,
    ) -> Result<Option<ServerConfig>, HorreumError> {
        let mut conn = self.acquire().await?;

        let sql = format!(
            r#"
        SELECT {SELECT_COLUMNS}
        FROM server_configs
        WHERE guild_id = ?
        "#
        );
        let sql = self.dialect.render(&sql);
        let row = sqlx::query_as::<_, ServerConfig>(sql.as_ref())
            .bind(guild_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row)
    }

    /// Applies a partial configuration update: only the fields the patch
    /// carries are written, everything else keeps its stored (or default)
    /// value. An empty patch still materializes the row at defaults.
    /// Returns the configuration as stored.
    pub async fn upsert_server_config(
        &self,
        guild_id: i64,
        patch: &ServerConfigPatch,
    ) -> Result<ServerConfig, HorreumError> {
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        if patch.is_empty() {
            let sql = self.dialect.render(
                r#"
            INSERT INTO server_configs (guild_id, created_at, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (guild_id) DO NOTHING
            "#,
            );
            sqlx::query(sql.as_ref())
                .bind(guild_id)
                .bind(now)
                .bind(now)
                .execute(&mut *conn)
                .await?;

            let sql = format!(
                r#"
            SELECT {SELECT_COLUMNS}
            FROM server_configs
            WHERE guild_id = ?
            "#
            );
            let sql = self.dialect.render(&sql);
            let row = sqlx::query_as::<_, ServerConfig>(sql.as_ref())
                .bind(guild_id)
                .fetch_one(&mut *conn)
                .await?;
            return Ok(row);
        }

        let mut fields: Vec<(&'static str, PatchBind)> = Vec::new();
        if let Some(v) = patch.admin_role_id {
            fields.push(("admin_role_id", PatchBind::Int(v)));
        }
        if let Some(v) = patch.log_channel_id {
            fields.push(("log_channel_id", PatchBind::Int(v)));
        }
        if let Some(v) = &patch.garden_channels {
            fields.push(("garden_channels", PatchBind::Text(serde_json::to_string(v)?)));
        }
        if let Some(v) = &patch.duel_channels {
            fields.push(("duel_channels", PatchBind::Text(serde_json::to_string(v)?)));
        }
        if let Some(v) = &patch.pet_channels {
            fields.push(("pet_channels", PatchBind::Text(serde_json::to_string(v)?)));
        }
        if let Some(v) = &patch.world_channels {
            fields.push(("world_channels", PatchBind::Text(serde_json::to_string(v)?)));
        }
        if let Some(v) = &patch.world_roles {
            fields.push(("world_roles", PatchBind::Text(serde_json::to_string(v)?)));
        }
        if let Some(v) = patch.setup_complete {
            fields.push(("setup_complete", PatchBind::Int(i64::from(v))));
        }

        let mut insert_cols = String::from("guild_id");
        let mut insert_vals = String::from("?");
        let mut updates = String::new();
        for (col, _) in &fields {
            insert_cols.push_str(", ");
            insert_cols.push_str(col);
            insert_vals.push_str(", ?");
            if !updates.is_empty() {
                updates.push_str(", ");
            }
            updates.push_str(col);
            updates.push_str(" = excluded.");
            updates.push_str(col);
        }

        let sql = format!(
            r#"
        INSERT INTO server_configs ({insert_cols}, created_at, updated_at)
        VALUES ({insert_vals}, ?, ?)
        ON CONFLICT (guild_id) DO UPDATE SET
            {updates},
            updated_at = excluded.updated_at
        RETURNING {SELECT_COLUMNS}
        "#
        );
        let sql = self.dialect.render(&sql);

        let written = fields.len();
        let mut query = sqlx::query_as::<_, ServerConfig>(sql.as_ref()).bind(guild_id);
        for (_, value) in fields {
            query = match value {
                PatchBind::Int(v) => query.bind(v),
                PatchBind::Text(v) => query.bind(v),
            };
        }
        let row = query
            .bind(now)
            .bind(now)
            .fetch_one(&mut *conn)
            .await?;

        debug!(guild_id, written, "server config patch applied");
        Ok(row)
    }

    /// Whether a member may administer the bot in this guild: true for the
    /// platform Administrator permission, or for holding the configured
    /// admin role.
    pub async fn is_admin(&self, guild_id: i64, member: &GuildMember) -> Result<bool, HorreumError> {
        if member.is_administrator {
            return Ok(true);
        }

        let config = self.get_server_config(guild_id).await?;
        Ok(config
            .and_then(|c| c.admin_role_id)
            .is_some_and(|role| member.role_ids.contains(&role)))
    }
}
