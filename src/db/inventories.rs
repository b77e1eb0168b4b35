//! Inventories: per-item quantities with a high-water item level.

use tracing::debug;

use crate::db::StateStore;
use crate::db::models::{InventoryItem, now_epoch};
use crate::db::partition::resolve_partition;
use crate::db::users::ensure_user_row;
use crate::error::HorreumError;

impl StateStore {
    /// A user's full inventory, ordered by item name.
    pub async fn get_inventory(
        &self,
        user_id: i64,
        guild_id: i64,
    ) -> Result<Vec<InventoryItem>, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        SELECT user_id, guild_id, item_name, quantity, item_level
        FROM inventories
        WHERE guild_id = ? AND user_id = ?
        ORDER BY item_name
        "#,
        );
        let rows = sqlx::query_as::<_, InventoryItem>(sql.as_ref())
            .bind(partition)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows)
    }

    /// Adds to an item stack. Quantities accumulate and the item level keeps
    /// its high-water mark, in one atomic statement, so concurrent grants
    /// settle to the sum. Returns the row as stored.
    pub async fn add_inventory_item(
        &self,
        user_id: i64,
        guild_id: i64,
        item_name: &str,
        quantity: i64,
        item_level: i64,
    ) -> Result<InventoryItem, HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        ensure_user_row(&mut *conn, self.dialect, user_id, partition, now).await?;

        let sql = format!(
            r#"
        INSERT INTO inventories (user_id, guild_id, item_name, quantity, item_level)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (guild_id, user_id, item_name) DO UPDATE SET
            quantity = inventories.quantity + excluded.quantity,
            item_level = {greatest}(inventories.item_level, excluded.item_level)
        RETURNING user_id, guild_id, item_name, quantity, item_level
        "#,
            greatest = self.dialect.greatest()
        );
        let sql = self.dialect.render(&sql);
        let row = sqlx::query_as::<_, InventoryItem>(sql.as_ref())
            .bind(user_id)
            .bind(partition)
            .bind(item_name.to_string())
            .bind(quantity)
            .bind(item_level)
            .fetch_one(&mut *conn)
            .await?;

        debug!(
            user_id,
            partition,
            item_name,
            quantity = row.quantity,
            "inventory item added"
        );
        Ok(row)
    }

    /// Raises an item's level; lower values never overwrite the stored
    /// high-water mark. A missing stack is left alone.
    pub async fn update_item_level(
        &self,
        user_id: i64,
        guild_id: i64,
        item_name: &str,
        item_level: i64,
    ) -> Result<(), HorreumError> {
        let partition = resolve_partition(user_id, guild_id);
        let mut conn = self.acquire().await?;

        let sql = format!(
            r#"
        UPDATE inventories
        SET item_level = {greatest}(item_level, ?)
        WHERE guild_id = ? AND user_id = ? AND item_name = ?
        "#,
            greatest = self.dialect.greatest()
        );
        let sql = self.dialect.render(&sql);
        let affected = sqlx::query(sql.as_ref())
            .bind(item_level)
            .bind(partition)
            .bind(user_id)
            .bind(item_name.to_string())
            .execute(&mut *conn)
            .await?
            .rows_affected();

        debug!(user_id, partition, item_name, affected, "item level raised");
        Ok(())
    }
}
