//! Gardens: per-user aggregate of plants and watering times. Harvesting is
//! one-way; harvested rows stay behind as history and never resurface.

use tracing::debug;

use crate::db::StateStore;
use crate::db::models::{Garden, GardenPlant, epoch_to_datetime, now_epoch};
use crate::db::partition::resolve_partition;
use crate::error::HorreumError;

impl StateStore {
    /// Assembles a garden with its active (unharvested) plants and watering
    /// map, or `None` when the user has no garden in this partition.
    pub async fn get_garden(
        &self,
        user_id: i64,
        guild_id: i64,
    ) -> Result<Option<Garden>, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        SELECT tier, level, created_at, updated_at
        FROM gardens
        WHERE guild_id = ? AND user_id = ?
        "#,
        );
        let base: Option<(String, i64, i64, i64)> = sqlx::query_as(sql.as_ref())
            .bind(partition)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
        let Some((tier, level, created_at, updated_at)) = base else {
            return Ok(None);
        };

        let sql = self.dialect.render(
            r#"
        SELECT plant_name, planted_at
        FROM garden_plants
        WHERE guild_id = ? AND user_id = ? AND harvested = 0
        ORDER BY planted_at
        "#,
        );
        let plants = sqlx::query_as::<_, GardenPlant>(sql.as_ref())
            .bind(partition)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

        let sql = self.dialect.render(
            r#"
        SELECT plant_name, last_watered
        FROM garden_watering
        WHERE guild_id = ? AND user_id = ?
        "#,
        );
        let watering: Vec<(String, i64)> = sqlx::query_as(sql.as_ref())
            .bind(partition)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(Some(Garden {
            user_id,
            guild_id: partition,
            tier,
            level,
            plants,
            last_watered: watering
                .into_iter()
                .map(|(name, ts)| (name, epoch_to_datetime(ts)))
                .collect(),
            created_at: epoch_to_datetime(created_at),
            updated_at: epoch_to_datetime(updated_at),
        }))
    }

    /// Every garden in a guild, ordered by owner id.
    pub async fn list_gardens(&self, guild_id: i64) -> Result<Vec<Garden>, HorreumError> {
        let owners: Vec<i64> = {
            // Release the listing connection before the per-garden reads
            // re-acquire; the embedded pool holds a single connection.
            let mut conn = self.acquire().await?;
            let sql = self.dialect.render(
                r#"
            SELECT user_id FROM gardens
            WHERE guild_id = ?
            ORDER BY user_id
            "#,
            );
            sqlx::query_scalar(sql.as_ref())
                .bind(guild_id)
                .fetch_all(&mut *conn)
                .await?
        };

        let mut gardens = Vec::with_capacity(owners.len());
        for user_id in owners {
            if let Some(garden) = self.get_garden(user_id, guild_id).await? {
                gardens.push(garden);
            }
        }
        Ok(gardens)
    }

    /// Opens a garden at the given tier and level 1. Returns `false` when
    /// the user already has one in this partition.
    pub async fn create_garden(
        &self,
        user_id: i64,
        guild_id: i64,
        tier: &str,
    ) -> Result<bool, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO gardens (user_id, guild_id, tier, level, created_at, updated_at)
        VALUES (?, ?, ?, 1, ?, ?)
        ON CONFLICT (guild_id, user_id) DO NOTHING
        "#,
        );
        let inserted = sqlx::query(sql.as_ref())
            .bind(user_id)
            .bind(partition)
            .bind(tier.to_string())
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?
            .rows_affected()
            == 1;

        debug!(user_id, partition, tier, inserted, "garden created");
        Ok(inserted)
    }

    /// Writes a garden wholesale in one transaction: the base row is
    /// upserted, and when `plants` is given, the active plant set is
    /// replaced by it. Harvested rows are never touched, and `None` leaves
    /// the plants as they are.
    pub async fn save_garden(
        &self,
        user_id: i64,
        guild_id: i64,
        tier: &str,
        level: i64,
        plants: Option<&[GardenPlant]>,
    ) -> Result<(), HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let now = now_epoch();
        let mut tx = self.pool.begin().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO gardens (user_id, guild_id, tier, level, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (guild_id, user_id) DO UPDATE SET
            tier = excluded.tier,
            level = excluded.level,
            updated_at = excluded.updated_at
        "#,
        );
        sqlx::query(sql.as_ref())
            .bind(user_id)
            .bind(partition)
            .bind(tier.to_string())
            .bind(level)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        if let Some(plants) = plants {
            let sql = self.dialect.render(
                r#"
            DELETE FROM garden_plants
            WHERE guild_id = ? AND user_id = ? AND harvested = 0
            "#,
            );
            sqlx::query(sql.as_ref())
                .bind(partition)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            for plant in plants {
                let sql = self.dialect.render(
                    r#"
                INSERT INTO garden_plants (user_id, guild_id, plant_name, planted_at, harvested)
                VALUES (?, ?, ?, ?, 0)
                "#,
                );
                sqlx::query(sql.as_ref())
                    .bind(user_id)
                    .bind(partition)
                    .bind(plant.name.clone())
                    .bind(plant.planted_at.timestamp())
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        debug!(user_id, partition, tier, level, "garden saved");
        Ok(())
    }

    /// Plants one seed now. The garden base row is created on the fly if the
    /// user has none yet.
    pub async fn add_garden_plant(
        &self,
        user_id: i64,
        guild_id: i64,
        plant_name: &str,
    ) -> Result<(), HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO gardens (user_id, guild_id, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (guild_id, user_id) DO NOTHING
        "#,
        );
        sqlx::query(sql.as_ref())
            .bind(user_id)
            .bind(partition)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO garden_plants (user_id, guild_id, plant_name, planted_at, harvested)
        VALUES (?, ?, ?, ?, 0)
        "#,
        );
        sqlx::query(sql.as_ref())
            .bind(user_id)
            .bind(partition)
            .bind(plant_name.to_string())
            .bind(now)
            .execute(&mut *conn)
            .await?;

        debug!(user_id, partition, plant_name, "plant added");
        Ok(())
    }

    /// Records that a plant was watered just now.
    pub async fn water_plant(
        &self,
        user_id: i64,
        guild_id: i64,
        plant_name: &str,
    ) -> Result<(), HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO garden_watering (user_id, guild_id, plant_name, last_watered)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (guild_id, user_id, plant_name) DO UPDATE SET
            last_watered = excluded.last_watered
        "#,
        );
        sqlx::query(sql.as_ref())
            .bind(user_id)
            .bind(partition)
            .bind(plant_name.to_string())
            .bind(now)
            .execute(&mut *conn)
            .await?;

        debug!(user_id, partition, plant_name, "plant watered");
        Ok(())
    }

    /// Marks active plants harvested: one named plant's rows, or the whole
    /// garden when `plant_name` is `None`. Already-harvested rows never
    /// flip back. Returns how many rows were harvested.
    pub async fn harvest_plants(
        &self,
        user_id: i64,
        guild_id: i64,
        plant_name: Option<&str>,
    ) -> Result<u64, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let mut conn = self.acquire().await?;

        let affected = match plant_name {
            Some(name) => {
                let sql = self.dialect.render(
                    r#"
                UPDATE garden_plants
                SET harvested = 1
                WHERE guild_id = ? AND user_id = ? AND plant_name = ? AND harvested = 0
                "#,
                );
                sqlx::query(sql.as_ref())
                    .bind(partition)
                    .bind(user_id)
                    .bind(name.to_string())
                    .execute(&mut *conn)
                    .await?
                    .rows_affected()
            }
            None => {
                let sql = self.dialect.render(
                    r#"
                UPDATE garden_plants
                SET harvested = 1
                WHERE guild_id = ? AND user_id = ? AND harvested = 0
                "#,
                );
                sqlx::query(sql.as_ref())
                    .bind(partition)
                    .bind(user_id)
                    .execute(&mut *conn)
                    .await?
                    .rows_affected()
            }
        };

        debug!(user_id, partition, affected, "plants harvested");
        Ok(affected)
    }
}
