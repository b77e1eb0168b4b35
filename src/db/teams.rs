//! Teams: guild-scoped aggregate of the base row and five child tables.

use tracing::debug;

use crate::db::StateStore;
use crate::db::models::{Team, TeamRelationKind, now_epoch};
use crate::db::patch::TeamCreate;
use crate::error::HorreumError;

impl StateStore {
    /// Assembles the full team aggregate, or `None` when the base row is
    /// absent (child tables are not queried in that case). A child query
    /// failing fails the whole read.
    pub async fn get_team(
        &self,
        team_id: i64,
        guild_id: i64,
    ) -> Result<Option<Team>, HorreumError> {
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        SELECT guild_id, team_id, name, leader_id, base_tier, base_color, gym_level, arena_level,
               team_chi, team_score, wins, losses, ties, created_at, updated_at
        FROM teams
        WHERE guild_id = ? AND team_id = ?
        "#,
        );
        let Some(mut team) = sqlx::query_as::<_, Team>(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .fetch_optional(&mut *conn)
            .await?
        else {
            return Ok(None);
        };

        let sql = self.dialect.render(
            r#"
        SELECT user_id FROM team_members
        WHERE guild_id = ? AND team_id = ?
        ORDER BY user_id
        "#,
        );
        let member_ids: Vec<i64> = sqlx::query_scalar(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .fetch_all(&mut *conn)
            .await?;
        team.members = member_ids.iter().map(ToString::to_string).collect();

        let sql = self.dialect.render(
            r#"
        SELECT module_name, level FROM team_modules
        WHERE guild_id = ? AND team_id = ?
        "#,
        );
        let modules: Vec<(String, i64)> = sqlx::query_as(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .fetch_all(&mut *conn)
            .await?;
        team.modules = modules.into_iter().collect();

        let sql = self.dialect.render(
            r#"
        SELECT decoration_name FROM team_decorations
        WHERE guild_id = ? AND team_id = ?
        ORDER BY decoration_name
        "#,
        );
        team.decorations = sqlx::query_scalar(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .fetch_all(&mut *conn)
            .await?;

        let sql = self.dialect.render(
            r#"
        SELECT equipment_name FROM team_equipment
        WHERE guild_id = ? AND team_id = ?
        ORDER BY equipment_name
        "#,
        );
        team.equipment = sqlx::query_scalar(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .fetch_all(&mut *conn)
            .await?;

        let sql = self.dialect.render(
            r#"
        SELECT related_team_id, relation_type FROM team_relations
        WHERE guild_id = ? AND team_id = ?
        ORDER BY related_team_id
        "#,
        );
        let relations: Vec<(i64, String)> = sqlx::query_as(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .fetch_all(&mut *conn)
            .await?;
        for (related, kind) in relations {
            // Tags other than ally/enemy are skipped, matching the writers.
            match kind.as_str() {
                "ally" => team.allies.push(related),
                "enemy" => team.enemies.push(related),
                _ => {}
            }
        }

        Ok(Some(team))
    }

    /// Every team aggregate in a guild, ordered by team id.
    pub async fn list_teams(&self, guild_id: i64) -> Result<Vec<Team>, HorreumError> {
        let ids: Vec<i64> = {
            // Release the listing connection before the per-team reads
            // re-acquire; the embedded pool holds a single connection.
            let mut conn = self.acquire().await?;
            let sql = self.dialect.render(
                r#"
            SELECT team_id FROM teams
            WHERE guild_id = ?
            ORDER BY team_id
            "#,
            );
            sqlx::query_scalar(sql.as_ref())
                .bind(guild_id)
                .fetch_all(&mut *conn)
                .await?
        };

        let mut teams = Vec::with_capacity(ids.len());
        for team_id in ids {
            if let Some(team) = self.get_team(team_id, guild_id).await? {
                teams.push(team);
            }
        }
        Ok(teams)
    }

    /// Registers a team. Tier, color, levels, and counters start at their
    /// defaults. Returns `false` when the team already exists.
    pub async fn create_team(
        &self,
        guild_id: i64,
        create: &TeamCreate,
    ) -> Result<bool, HorreumError> {
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO teams (guild_id, team_id, name, leader_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (guild_id, team_id) DO NOTHING
        "#,
        );
        let inserted = sqlx::query(sql.as_ref())
            .bind(guild_id)
            .bind(create.team_id)
            .bind(create.name.clone())
            .bind(create.leader_id)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?
            .rows_affected()
            == 1;

        debug!(guild_id, team_id = create.team_id, inserted, "team created");
        Ok(inserted)
    }

    /// Adds a member to a team roster; already-present members are left
    /// alone.
    pub async fn add_team_member(
        &self,
        team_id: i64,
        guild_id: i64,
        user_id: i64,
    ) -> Result<bool, HorreumError> {
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO team_members (guild_id, team_id, user_id)
        VALUES (?, ?, ?)
        ON CONFLICT (guild_id, team_id, user_id) DO NOTHING
        "#,
        );
        let inserted = sqlx::query(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?
            .rows_affected()
            == 1;

        debug!(guild_id, team_id, user_id, inserted, "team member added");
        Ok(inserted)
    }

    /// Sets a team's pooled chi outright. A missing team is left alone.
    pub async fn update_team_chi(
        &self,
        team_id: i64,
        guild_id: i64,
        team_chi: i64,
    ) -> Result<(), HorreumError> {
        let now = now_epoch();
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        UPDATE teams
        SET team_chi = ?, updated_at = ?
        WHERE guild_id = ? AND team_id = ?
        "#,
        );
        let affected = sqlx::query(sql.as_ref())
            .bind(team_chi)
            .bind(now)
            .bind(guild_id)
            .bind(team_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        debug!(guild_id, team_id, team_chi, affected, "team chi updated");
        Ok(())
    }

    /// Installs a module or sets an installed module's level.
    pub async fn add_team_module(
        &self,
        team_id: i64,
        guild_id: i64,
        module_name: &str,
        level: i64,
    ) -> Result<(), HorreumError> {
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO team_modules (guild_id, team_id, module_name, level)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (guild_id, team_id, module_name) DO UPDATE SET
            level = excluded.level
        "#,
        );
        sqlx::query(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .bind(module_name.to_string())
            .bind(level)
            .execute(&mut *conn)
            .await?;

        debug!(guild_id, team_id, module_name, level, "team module written");
        Ok(())
    }

    /// Places a decoration; duplicates are left alone.
    pub async fn add_team_decoration(
        &self,
        team_id: i64,
        guild_id: i64,
        decoration_name: &str,
    ) -> Result<bool, HorreumError> {
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO team_decorations (guild_id, team_id, decoration_name)
        VALUES (?, ?, ?)
        ON CONFLICT (guild_id, team_id, decoration_name) DO NOTHING
        "#,
        );
        let inserted = sqlx::query(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .bind(decoration_name.to_string())
            .execute(&mut *conn)
            .await?
            .rows_affected()
            == 1;

        debug!(guild_id, team_id, decoration_name, inserted, "team decoration added");
        Ok(inserted)
    }

    /// Stores a piece of equipment; duplicates are left alone.
    pub async fn add_team_equipment(
        &self,
        team_id: i64,
        guild_id: i64,
        equipment_name: &str,
    ) -> Result<bool, HorreumError> {
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO team_equipment (guild_id, team_id, equipment_name)
        VALUES (?, ?, ?)
        ON CONFLICT (guild_id, team_id, equipment_name) DO NOTHING
        "#,
        );
        let inserted = sqlx::query(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .bind(equipment_name.to_string())
            .execute(&mut *conn)
            .await?
            .rows_affected()
            == 1;

        debug!(guild_id, team_id, equipment_name, inserted, "team equipment added");
        Ok(inserted)
    }

    /// Tags another team as ally or enemy. The same pair can carry both
    /// tags; re-tagging is a no-op.
    pub async fn add_team_relation(
        &self,
        team_id: i64,
        guild_id: i64,
        related_team_id: i64,
        kind: TeamRelationKind,
    ) -> Result<bool, HorreumError> {
        let mut conn = self.acquire().await?;

        let sql = self.dialect.render(
            r#"
        INSERT INTO team_relations (guild_id, team_id, related_team_id, relation_type)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (guild_id, team_id, related_team_id, relation_type) DO NOTHING
        "#,
        );
        let inserted = sqlx::query(sql.as_ref())
            .bind(guild_id)
            .bind(team_id)
            .bind(related_team_id)
            .bind(kind.as_str().to_string())
            .execute(&mut *conn)
            .await?
            .rows_affected()
            == 1;

        debug!(
            guild_id,
            team_id,
            related_team_id,
            kind = kind.as_str(),
            inserted,
            "team relation tagged"
        );
        Ok(inserted)
    }
}
