//! Artifacts: globally unique collectibles, immutable once created.

use tracing::debug;

use crate::db::StateStore;
use crate::db::models::{Artifact, now_epoch};
use crate::db::partition::resolve_partition;
use crate::db::patch::ArtifactCreate;
use crate::db::users::ensure_user_row;
use crate::error::HorreumError;

impl StateStore {
    /// A user's artifacts, ordered by artifact id.
    pub async fn get_artifacts(
        &self,
        user_id: i64,
        guild_id: i64,
    ) -> Result<Vec<Artifact>, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        SELECT artifact_id, user_id, guild_id, tier, emoji, name
        FROM artifacts
        WHERE guild_id = ? AND user_id = ?
        ORDER BY artifact_id
        "#,
        );
        let rows = sqlx::query_as::<_, Artifact>(sql.as_ref())
            .bind(partition)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows)
    }

    /// Grants an artifact. Artifact ids are unique across every guild; an id
    /// that already exists anywhere leaves the stored row untouched and
    /// returns `false`.
    pub async fn add_artifact(
        &self,
        user_id: i64,
        guild_id: i64,
        create: &ArtifactCreate,
    ) -> Result<bool, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        ensure_user_row(&mut *conn, self.dialect, user_id, partition, now).await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO artifacts (artifact_id, user_id, guild_id, tier, emoji, name)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (artifact_id) DO NOTHING
        "#,
        );
        let inserted = sqlx::query(sql.as_ref())
            .bind(create.artifact_id.clone())
            .bind(user_id)
            .bind(partition)
            .bind(create.tier.clone())
            .bind(create.emoji.clone())
            .bind(create.name.clone())
            .execute(&mut *conn)
            .await?
            .rows_affected()
            == 1;

        debug!(
            user_id,
            partition,
            artifact_id = %create.artifact_id,
            inserted,
            "artifact grant"
        );
        Ok(inserted)
    }

    /// Removes an artifact from its owner. Returns `false` when the id does
    /// not belong to this user in this partition.
    pub async fn remove_artifact(
        &self,
        user_id: i64,
        guild_id: i64,
        artifact_id: &str,
    ) -> Result<bool, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        DELETE FROM artifacts
        WHERE artifact_id = ? AND guild_id = ? AND user_id = ?
        "#,
        );
        let removed = sqlx::query(sql.as_ref())
            .bind(artifact_id.to_string())
            .bind(partition)
            .bind(user_id)
            .execute(&mut *conn)
            .await?
            .rows_affected()
            == 1;

        debug!(user_id, partition, artifact_id, removed, "artifact removal");
        Ok(removed)
    }
}
