//! User records: chi, rebirths, progress sets, equipped pet.

use sqlx::Any;
use tracing::debug;

use crate::db::StateStore;
use crate::db::dialect::Dialect;
use crate::db::models::{User, now_epoch};
use crate::db::partition::resolve_partition;
use crate::db::patch::UserUpsert;
use crate::error::HorreumError;

impl StateStore {
    /// Fetches a user's record from the partition the caller resolves to.
    pub async fn get_user(
        &self,
        user_id: i64,
        guild_id: i64,
    ) -> Result<Option<User>, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        SELECT user_id, guild_id, chi, rebirths, milestones_claimed, mini_quests, active_pet, created_at, updated_at
        FROM users
        WHERE guild_id = ? AND user_id = ?
        "#,
        );
        let row = sqlx::query_as::<_, User>(sql.as_ref())
            .bind(partition)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row)
    }

    /// Inserts or updates a user. Scalar fields replace (`None` leaves them
    /// alone); the milestone and mini-quest sets merge with what is stored.
    /// Returns the record as written.
    pub async fn upsert_user(
        &self,
        user_id: i64,
        guild_id: i64,
        upsert: &UserUpsert,
    ) -> Result<User, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        ensure_user_row(&mut *conn, self.dialect, user_id, partition, now).await?;

        let sql = self.dialect.render(
            r#"
        SELECT milestones_claimed, mini_quests
        FROM users
        WHERE guild_id = ? AND user_id = ?
        "#,
        );
        let (stored_milestones, stored_quests): (String, String) =
            sqlx::query_as(sql.as_ref())
                .bind(partition)
                .bind(user_id)
                .fetch_one(&mut *conn)
                .await?;

        let milestones = merge_names(&stored_milestones, &upsert.milestones_claimed)?;
        let quests = merge_names(&stored_quests, &upsert.mini_quests)?;

        let sql = self.dialect.render(
            r#"
        UPDATE users SET
            chi = COALESCE(?, chi),
            rebirths = COALESCE(?, rebirths),
            active_pet = COALESCE(?, active_pet),
            milestones_claimed = ?,
            mini_quests = ?,
            updated_at = ?
        WHERE guild_id = ? AND user_id = ?
        "#,
        );
        sqlx::query(sql.as_ref())
            .bind(upsert.chi)
            .bind(upsert.rebirths)
            .bind(upsert.active_pet.clone())
            .bind(milestones)
            .bind(quests)
            .bind(now)
            .bind(partition)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        debug!(user_id, partition, "user upsert applied");

        let sql = self.dialect.render(
            r#"
        SELECT user_id, guild_id, chi, rebirths, milestones_claimed, mini_quests, active_pet, created_at, updated_at
        FROM users
        WHERE guild_id = ? AND user_id = ?
        "#,
        );
        let row = sqlx::query_as::<_, User>(sql.as_ref())
            .bind(partition)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(row)
    }

    /// Sets a user's chi outright. Last write wins; concurrent spends are
    /// settled by the command layer.
    pub async fn update_user_chi(
        &self,
        user_id: i64,
        guild_id: i64,
        chi: i64,
    ) -> Result<(), HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO users (user_id, guild_id, chi, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (guild_id, user_id) DO UPDATE SET
            chi = excluded.chi,
            updated_at = excluded.updated_at
        "#,
        );
        sqlx::query(sql.as_ref())
            .bind(user_id)
            .bind(partition)
            .bind(chi)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        debug!(user_id, partition, chi, "user chi updated");
        Ok(())
    }

    /// Sets a user's rebirth count outright.
    pub async fn update_user_rebirths(
        &self,
        user_id: i64,
        guild_id: i64,
        rebirths: i64,
    ) -> Result<(), HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO users (user_id, guild_id, rebirths, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (guild_id, user_id) DO UPDATE SET
            rebirths = excluded.rebirths,
            updated_at = excluded.updated_at
        "#,
        );
        sqlx::query(sql.as_ref())
            .bind(user_id)
            .bind(partition)
            .bind(rebirths)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        debug!(user_id, partition, rebirths, "user rebirths updated");
        Ok(())
    }

    /// All user records in a guild, ordered by user id.
    pub async fn list_users(&self, guild_id: i64) -> Result<Vec<User>, HorreumError> {
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        SELECT user_id, guild_id, chi, rebirths, milestones_claimed, mini_quests, active_pet, created_at, updated_at
        FROM users
        WHERE guild_id = ?
        ORDER BY user_id
        "#,
        );
        let rows = sqlx::query_as::<_, User>(sql.as_ref())
            .bind(guild_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows)
    }
}

/// Guarantees the `(partition, user)` row exists so child writes and partial
/// updates have something to land on.
pub(crate) async fn ensure_user_row<'e, E>(
    executor: E,
    dialect: Dialect,
    user_id: i64,
    partition: i64,
    now: i64,
) -> Result<(), HorreumError>
where
    E: sqlx::Executor<'e, Database = Any>,
{
    let sql = dialect.render(
        r#"
    INSERT INTO users (user_id, guild_id, created_at, updated_at)
    VALUES (?, ?, ?, ?)
    ON CONFLICT (guild_id, user_id) DO NOTHING
    "#,
    );
    sqlx::query(sql.as_ref())
        .bind(user_id)
        .bind(partition)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await?;

    Ok(())
}

// Stored sets are JSON name arrays; merging keeps stored order and appends
// unseen names in payload order.
fn merge_names(stored: &str, incoming: &[String]) -> Result<String, HorreumError> {
    let mut names: Vec<String> = serde_json::from_str(stored)?;
    for name in incoming {
        if !names.iter().any(|n| n == name) {
            names.push(name.clone());
        }
    }
    Ok(serde_json::to_string(&names)?)
}

#[cfg(test)]
mod tests {
    use super::merge_names;

    #[test]
    fn merge_keeps_stored_order_and_appends_new_names() {
        let merged = merge_names(
            r#"["first","second"]"#,
            &["second".to_string(), "third".to_string()],
        )
        .unwrap();
        assert_eq!(merged, r#"["first","second","third"]"#);
    }

    #[test]
    fn merge_with_nothing_incoming_is_identity() {
        let merged = merge_names(r#"["first"]"#, &[]).unwrap();
        assert_eq!(merged, r#"["first"]"#);
    }
}
