//! Pets: one row per species per owner, keyed `"{user_id}_{pet_id}"`.

use tracing::debug;

use crate::db::StateStore;
use crate::db::models::{Pet, now_epoch};
use crate::db::partition::resolve_partition;
use crate::db::patch::PetUpsert;
use crate::db::users::ensure_user_row;
use crate::error::HorreumError;

impl StateStore {
    /// A user's pets, ordered by species id.
    pub async fn get_pets(&self, user_id: i64, guild_id: i64) -> Result<Vec<Pet>, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        SELECT id, user_id, guild_id, pet_id, name, nickname, health, max_health, attack, hunger
        FROM pets
        WHERE guild_id = ? AND user_id = ?
        ORDER BY pet_id
        "#,
        );
        let rows = sqlx::query_as::<_, Pet>(sql.as_ref())
            .bind(partition)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows)
    }

    /// Writes a pet wholesale. Adopting a species the user already owns
    /// refreshes its health, hunger, and nickname from the payload. Returns
    /// the row as stored.
    pub async fn add_pet(
        &self,
        user_id: i64,
        guild_id: i64,
        pet: &PetUpsert,
    ) -> Result<Pet, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        ensure_user_row(&mut *conn, self.dialect, user_id, partition, now).await?;

        let id = format!("{user_id}_{pet_id}", pet_id = pet.pet_id);
        let sql = self.dialect.render(
            r#"
        INSERT INTO pets (id, user_id, guild_id, pet_id, name, nickname, health, max_health, attack, hunger)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            health = excluded.health,
            hunger = excluded.hunger,
            nickname = excluded.nickname
        RETURNING id, user_id, guild_id, pet_id, name, nickname, health, max_health, attack, hunger
        "#,
        );
        let row = sqlx::query_as::<_, Pet>(sql.as_ref())
            .bind(id)
            .bind(user_id)
            .bind(partition)
            .bind(pet.pet_id.clone())
            .bind(pet.name.clone())
            .bind(pet.nickname.clone())
            .bind(pet.health)
            .bind(pet.max_health)
            .bind(pet.attack)
            .bind(pet.hunger)
            .fetch_one(&mut *conn)
            .await?;

        debug!(user_id, partition, pet_id = %pet.pet_id, "pet written");
        Ok(row)
    }
}
