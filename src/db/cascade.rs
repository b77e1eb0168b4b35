//! Whole-guild deletion for when the bot leaves a guild: one transaction,
//! children before parents, counted per table.

use sqlx::{Any, Transaction};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::db::StateStore;
use crate::db::dialect::Dialect;
use crate::db::partition::{GLOBAL_GUILD_ID, SUPER_ADMIN_USER_ID};
use crate::error::HorreumError;

// Deletion order within each family: children first, parents last.
const TEAM_CHILD_TABLES: [&str; 5] = [
    "team_relations",
    "team_equipment",
    "team_decorations",
    "team_modules",
    "team_members",
];
// Garden children key off the gardens table: a garden can exist for a user
// who never earned a users row.
const GARDEN_CHILD_TABLES: [&str; 2] = ["garden_watering", "garden_plants"];
const USER_CHILD_TABLES: [&str; 3] = ["pets", "artifacts", "inventories"];

impl StateStore {
    /// Deletes every row a guild owns, in one transaction. The
    /// super-administrator's rows live in the global partition and are
    /// excluded, as is anything the same users own in other guilds. Returns
    /// deleted-row counts per table.
    ///
    /// Guild-removal events can arrive without a usable id; `None` and the
    /// global partition both make this a warned no-op so a malformed event
    /// can never wipe global state.
    pub async fn delete_guild_data(
        &self,
        guild_id: Option<i64>,
    ) -> Result<BTreeMap<String, u64>, HorreumError> {
        let Some(guild_id) = guild_id.filter(|id| *id != GLOBAL_GUILD_ID) else {
            warn!("guild deletion invoked without a usable guild id; nothing deleted");
            return Ok(BTreeMap::new());
        };

        let mut tx = self.pool.begin().await?;
        let mut stats = BTreeMap::new();

        for table in TEAM_CHILD_TABLES {
            let sql = format!(
                "DELETE FROM {table} WHERE guild_id = ? \
                 AND team_id IN (SELECT team_id FROM teams WHERE guild_id = ?)"
            );
            let rows =
                delete_rows(&mut tx, self.dialect, &sql, &[guild_id, guild_id]).await?;
            if rows > 0 {
                debug!(guild_id, table, rows, "guild rows deleted");
            }
            stats.insert(table.to_string(), rows);
        }

        let rows = delete_rows(
            &mut tx,
            self.dialect,
            "DELETE FROM teams WHERE guild_id = ?",
            &[guild_id],
        )
        .await?;
        if rows > 0 {
            debug!(guild_id, table = "teams", rows, "guild rows deleted");
        }
        stats.insert("teams".to_string(), rows);

        for table in GARDEN_CHILD_TABLES {
            let sql = format!(
                "DELETE FROM {table} WHERE guild_id = ? \
                 AND user_id IN (SELECT user_id FROM gardens WHERE guild_id = ? AND user_id != ?)"
            );
            let rows = delete_rows(
                &mut tx,
                self.dialect,
                &sql,
                &[guild_id, guild_id, SUPER_ADMIN_USER_ID],
            )
            .await?;
            if rows > 0 {
                debug!(guild_id, table, rows, "guild rows deleted");
            }
            stats.insert(table.to_string(), rows);
        }

        let rows = delete_rows(
            &mut tx,
            self.dialect,
            "DELETE FROM gardens WHERE guild_id = ? AND user_id != ?",
            &[guild_id, SUPER_ADMIN_USER_ID],
        )
        .await?;
        if rows > 0 {
            debug!(guild_id, table = "gardens", rows, "guild rows deleted");
        }
        stats.insert("gardens".to_string(), rows);

        for table in USER_CHILD_TABLES {
            let sql = format!(
                "DELETE FROM {table} WHERE guild_id = ? \
                 AND user_id IN (SELECT user_id FROM users WHERE guild_id = ? AND user_id != ?)"
            );
            let rows = delete_rows(
                &mut tx,
                self.dialect,
                &sql,
                &[guild_id, guild_id, SUPER_ADMIN_USER_ID],
            )
            .await?;
            if rows > 0 {
                debug!(guild_id, table, rows, "guild rows deleted");
            }
            stats.insert(table.to_string(), rows);
        }

        let rows = delete_rows(
            &mut tx,
            self.dialect,
            "DELETE FROM users WHERE guild_id = ? AND user_id != ?",
            &[guild_id, SUPER_ADMIN_USER_ID],
        )
        .await?;
        if rows > 0 {
            debug!(guild_id, table = "users", rows, "guild rows deleted");
        }
        stats.insert("users".to_string(), rows);

        let rows = delete_rows(
            &mut tx,
            self.dialect,
            "DELETE FROM server_configs WHERE guild_id = ?",
            &[guild_id],
        )
        .await?;
        if rows > 0 {
            debug!(guild_id, table = "server_configs", rows, "guild rows deleted");
        }
        stats.insert("server_configs".to_string(), rows);

        tx.commit().await?;

        let total: u64 = stats.values().sum();
        info!(guild_id, total, "guild data deleted");
        Ok(stats)
    }
}

async fn delete_rows(
    tx: &mut Transaction<'_, Any>,
    dialect: Dialect,
    sql: &str,
    binds: &[i64],
) -> Result<u64, HorreumError> {
    let sql = dialect.render(sql);
    let mut query = sqlx::query(sql.as_ref());
    for bind in binds {
        query = query.bind(*bind);
    }
    Ok(query.execute(&mut **tx).await?.rows_affected())
}
