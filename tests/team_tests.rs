use horreum::{StateStore, StoreConfig, TeamCreate, TeamRelationKind};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const GUILD: i64 = 66_600;

fn temp_db_path(prefix: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    SystemTime::now().hash(&mut hasher);
    std::env::temp_dir().join(format!("{prefix}_{}.sqlite", hasher.finish()))
}

fn cleanup(db_path: &Path) {
    let base = db_path.to_str().unwrap();
    let _ = std::fs::remove_file(db_path);
    let _ = std::fs::remove_file(format!("{base}-wal"));
    let _ = std::fs::remove_file(format!("{base}-shm"));
}

fn roster(team_id: i64, name: &str, leader_id: i64) -> TeamCreate {
    TeamCreate {
        team_id,
        name: name.to_string(),
        leader_id,
    }
}

#[tokio::test]
async fn a_team_aggregate_composes_every_child_collection() {
    let db_path = temp_db_path("test_teams");
    let store = StateStore::connect(&StoreConfig::embedded(&db_path))
        .await
        .unwrap();

    // 1. First registration wins; the second is refused.
    assert!(store.create_team(GUILD, &roster(1, "Iron Lotus", 11)).await.unwrap());
    assert!(!store.create_team(GUILD, &roster(1, "Imposter", 99)).await.unwrap());
    store.create_team(GUILD, &roster(2, "River Clan", 21)).await.unwrap();

    // 2. Populate every child collection.
    for member in [13, 11, 12] {
        assert!(store.add_team_member(1, GUILD, member).await.unwrap());
    }
    assert!(
        !store.add_team_member(1, GUILD, 11).await.unwrap(),
        "Expected re-adding a member to be refused"
    );
    store.add_team_module(1, GUILD, "forge", 2).await.unwrap();
    store.add_team_module(1, GUILD, "dojo", 1).await.unwrap();
    store.add_team_decoration(1, GUILD, "banner").await.unwrap();
    store.add_team_equipment(1, GUILD, "war-drum").await.unwrap();
    assert!(store.add_team_relation(1, GUILD, 2, TeamRelationKind::Ally).await.unwrap());
    assert!(
        !store.add_team_relation(1, GUILD, 2, TeamRelationKind::Ally).await.unwrap(),
        "Expected a repeat tag to be refused"
    );
    // The same pair can carry both tags at once.
    assert!(store.add_team_relation(1, GUILD, 2, TeamRelationKind::Enemy).await.unwrap());

    // 3. The aggregate carries the base row, schema defaults, and all five
    //    child collections.
    let team = store.get_team(1, GUILD).await.unwrap().unwrap();
    assert_eq!(team.name, "Iron Lotus");
    assert_eq!(team.leader_id, 11);
    assert_eq!(team.base_tier, "solo");
    assert_eq!(team.base_color, "white");
    assert_eq!((team.gym_level, team.arena_level), (1, 1));
    assert_eq!((team.team_chi, team.team_score), (0, 0));
    assert_eq!(team.members, ["11", "12", "13"]);
    assert_eq!(team.modules.len(), 2);
    assert_eq!(team.modules.get("forge"), Some(&2));
    assert_eq!(team.modules.get("dojo"), Some(&1));
    assert_eq!(team.decorations, ["banner"]);
    assert_eq!(team.equipment, ["war-drum"]);
    assert_eq!(team.allies, [2]);
    assert_eq!(team.enemies, [2]);

    // 4. Nothing leaked into the second team.
    let other = store.get_team(2, GUILD).await.unwrap().unwrap();
    assert!(other.members.is_empty());
    assert!(other.modules.is_empty());
    assert!(other.allies.is_empty());

    store.disconnect().await;
    cleanup(&db_path);
}

#[tokio::test]
async fn missing_and_foreign_guild_teams_read_as_none() {
    let db_path = temp_db_path("test_teams_missing");
    let store = StateStore::connect(&StoreConfig::embedded(&db_path))
        .await
        .unwrap();

    store.create_team(GUILD, &roster(1, "Iron Lotus", 11)).await.unwrap();

    assert!(store.get_team(404, GUILD).await.unwrap().is_none());
    assert!(
        store.get_team(1, GUILD + 1).await.unwrap().is_none(),
        "Expected a team to be invisible from another guild"
    );

    // The same team id can exist independently per guild.
    store.create_team(GUILD + 1, &roster(1, "Other Lotus", 77)).await.unwrap();
    store.add_team_member(1, GUILD + 1, 78).await.unwrap();
    let here = store.get_team(1, GUILD).await.unwrap().unwrap();
    let there = store.get_team(1, GUILD + 1).await.unwrap().unwrap();
    assert_eq!(here.name, "Iron Lotus");
    assert!(here.members.is_empty());
    assert_eq!(there.name, "Other Lotus");
    assert_eq!(there.members, ["78"]);

    store.disconnect().await;
    cleanup(&db_path);
}

#[tokio::test]
async fn module_levels_replace_and_pooled_chi_sets_outright() {
    let db_path = temp_db_path("test_teams_levels");
    let store = StateStore::connect(&StoreConfig::embedded(&db_path))
        .await
        .unwrap();

    store.create_team(GUILD, &roster(1, "Iron Lotus", 11)).await.unwrap();

    // 1. Re-installing a module replaces its level, in either direction.
    store.add_team_module(1, GUILD, "forge", 1).await.unwrap();
    store.add_team_module(1, GUILD, "forge", 4).await.unwrap();
    store.add_team_module(1, GUILD, "forge", 3).await.unwrap();
    let team = store.get_team(1, GUILD).await.unwrap().unwrap();
    assert_eq!(team.modules.len(), 1);
    assert_eq!(team.modules.get("forge"), Some(&3));

    // 2. Pooled chi is a plain set, not an increment.
    store.update_team_chi(1, GUILD, 500).await.unwrap();
    store.update_team_chi(1, GUILD, 120).await.unwrap();
    let team = store.get_team(1, GUILD).await.unwrap().unwrap();
    assert_eq!(team.team_chi, 120);

    // 3. Setting chi on a team that does not exist creates nothing.
    store.update_team_chi(404, GUILD, 999).await.unwrap();
    assert!(store.get_team(404, GUILD).await.unwrap().is_none());

    // 4. The duel record is a projection of the stored counters.
    let stats = team.duel_stats();
    assert_eq!((stats.wins, stats.losses, stats.ties), (0, 0, 0));

    store.disconnect().await;
    cleanup(&db_path);
}

#[tokio::test]
async fn listing_composes_each_aggregate_in_id_order() {
    let db_path = temp_db_path("test_teams_list");
    let store = StateStore::connect(&StoreConfig::embedded(&db_path))
        .await
        .unwrap();

    store.create_team(GUILD, &roster(3, "Gamma", 31)).await.unwrap();
    store.create_team(GUILD, &roster(1, "Alpha", 11)).await.unwrap();
    store.create_team(GUILD, &roster(2, "Beta", 21)).await.unwrap();
    store.add_team_member(2, GUILD, 21).await.unwrap();
    store.create_team(GUILD + 1, &roster(9, "Elsewhere", 91)).await.unwrap();

    let teams = store.list_teams(GUILD).await.unwrap();
    let ids: Vec<i64> = teams.iter().map(|t| t.team_id).collect();
    assert_eq!(ids, [1, 2, 3]);
    assert_eq!(teams[1].members, ["21"], "Expected each listed team fully composed");
    assert!(teams[0].members.is_empty());

    assert!(store.list_teams(GUILD + 2).await.unwrap().is_empty());

    store.disconnect().await;
    cleanup(&db_path);
}
