use horreum::{
    ArtifactCreate, PetUpsert, SUPER_ADMIN_USER_ID, ServerConfigPatch, StateStore, StoreConfig,
    TeamCreate, TeamRelationKind,
};
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const GUILD_A: i64 = 99_900;
const GUILD_B: i64 = 99_901;
const PLAYER: i64 = 10;
const GARDENER: i64 = 12;

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

/// Populates guild A with one row-counted entry in every table, plus the
/// rows that must survive its deletion: the same player's state in guild B
/// and the super-administrator's global state.
async fn seed(store: &StateStore) {
    // Guild A, the guild that will be deleted.
    store.update_user_chi(PLAYER, GUILD_A, 100).await.unwrap();
    store.add_inventory_item(PLAYER, GUILD_A, "sword", 1, 1).await.unwrap();
    store.add_inventory_item(PLAYER, GUILD_A, "shield", 2, 1).await.unwrap();
    store
        .add_artifact(
            PLAYER,
            GUILD_A,
            &ArtifactCreate {
                artifact_id: "relic-1".to_string(),
                tier: "rare".to_string(),
                emoji: "🗿".to_string(),
                name: "Stone Sentinel".to_string(),
            },
        )
        .await
        .unwrap();
    store.add_pet(PLAYER, GUILD_A, &PetUpsert::new("wolf", "Wolf")).await.unwrap();
    store.create_garden(PLAYER, GUILD_A, "basic").await.unwrap();
    store.add_garden_plant(PLAYER, GUILD_A, "fire_lily").await.unwrap();
    store.add_garden_plant(PLAYER, GUILD_A, "moonpetal").await.unwrap();
    store.water_plant(PLAYER, GUILD_A, "fire_lily").await.unwrap();

    // Garden commands never create a users row; this player exists only in
    // the garden tables.
    store.create_garden(GARDENER, GUILD_A, "basic").await.unwrap();
    store.add_garden_plant(GARDENER, GUILD_A, "ivy").await.unwrap();
    store.water_plant(GARDENER, GUILD_A, "ivy").await.unwrap();

    store
        .create_team(GUILD_A, &TeamCreate { team_id: 1, name: "Iron Lotus".to_string(), leader_id: PLAYER })
        .await
        .unwrap();
    store
        .create_team(GUILD_A, &TeamCreate { team_id: 2, name: "River Clan".to_string(), leader_id: 21 })
        .await
        .unwrap();
    store.add_team_member(1, GUILD_A, PLAYER).await.unwrap();
    store.add_team_member(1, GUILD_A, 11).await.unwrap();
    store.add_team_module(1, GUILD_A, "forge", 2).await.unwrap();
    store.add_team_decoration(1, GUILD_A, "banner").await.unwrap();
    store.add_team_equipment(1, GUILD_A, "war-drum").await.unwrap();
    store.add_team_relation(1, GUILD_A, 2, TeamRelationKind::Ally).await.unwrap();

    store
        .upsert_server_config(GUILD_A, &ServerConfigPatch::default())
        .await
        .unwrap();

    // The same player's life in guild B, which must not be touched.
    store.update_user_chi(PLAYER, GUILD_B, 55).await.unwrap();
    store.add_pet(PLAYER, GUILD_B, &PetUpsert::new("crow", "Crow")).await.unwrap();

    // The super-administrator's rows live in the global partition even when
    // written "under" guild A.
    store.update_user_chi(SUPER_ADMIN_USER_ID, GUILD_A, 777).await.unwrap();
}

#[tokio::test]
async fn deleting_a_guild_takes_every_table_and_nothing_beyond_it() {
    let db_path = temp_db_path("test_cascade");
    let store = StateStore::connect(&StoreConfig::embedded(&db_path))
        .await
        .unwrap();
    seed(&store).await;

    // 1. The counts name every table, children included, and sum to the
    //    rows guild A actually owned.
    let stats = store.delete_guild_data(Some(GUILD_A)).await.unwrap();
    let expected: BTreeMap<String, u64> = [
        ("artifacts", 1),
        ("garden_plants", 3),
        ("garden_watering", 2),
        ("gardens", 2),
        ("inventories", 2),
        ("pets", 1),
        ("server_configs", 1),
        ("team_decorations", 1),
        ("team_equipment", 1),
        ("team_members", 2),
        ("team_modules", 1),
        ("team_relations", 1),
        ("teams", 2),
        ("users", 1),
    ]
    .into_iter()
    .map(|(table, rows)| (table.to_string(), rows))
    .collect();
    assert_eq!(stats, expected);
    assert_eq!(stats.values().sum::<u64>(), 21);

    // 2. Guild A reads as if it never existed.
    assert!(store.get_user(PLAYER, GUILD_A).await.unwrap().is_none());
    assert!(store.get_inventory(PLAYER, GUILD_A).await.unwrap().is_empty());
    assert!(store.get_artifacts(PLAYER, GUILD_A).await.unwrap().is_empty());
    assert!(store.get_pets(PLAYER, GUILD_A).await.unwrap().is_empty());
    assert!(store.get_garden(PLAYER, GUILD_A).await.unwrap().is_none());
    assert!(store.get_garden(GARDENER, GUILD_A).await.unwrap().is_none());
    assert!(store.get_team(1, GUILD_A).await.unwrap().is_none());
    assert!(store.list_teams(GUILD_A).await.unwrap().is_empty());
    assert!(store.get_server_config(GUILD_A).await.unwrap().is_none());

    // 3. The same player's guild B life is intact.
    let player_b = store.get_user(PLAYER, GUILD_B).await.unwrap().unwrap();
    assert_eq!(player_b.chi, 55);
    let pets_b = store.get_pets(PLAYER, GUILD_B).await.unwrap();
    assert_eq!(pets_b.len(), 1);
    assert_eq!(pets_b[0].pet_id, "crow");

    // 4. The super-administrator's global rows are untouched, and still
    //    readable "under" the deleted guild.
    let admin = store.get_user(SUPER_ADMIN_USER_ID, GUILD_A).await.unwrap().unwrap();
    assert_eq!(admin.chi, 777);

    // 5. A second sweep finds nothing left.
    let stats = store.delete_guild_data(Some(GUILD_A)).await.unwrap();
    assert_eq!(stats.len(), 14);
    assert!(stats.values().all(|rows| *rows == 0));

    store.disconnect().await;
    cleanup(&db_path);
}

#[tokio::test]
async fn missing_or_global_guild_ids_delete_nothing() {
    let db_path = temp_db_path("test_cascade_guard");
    let store = StateStore::connect(&StoreConfig::embedded(&db_path))
        .await
        .unwrap();
    seed(&store).await;

    // 1. A deletion event without a usable id is a no-op.
    assert!(store.delete_guild_data(None).await.unwrap().is_empty());

    // 2. So is one naming the global partition; the super-administrator's
    //    state cannot be wiped through this path.
    assert!(store.delete_guild_data(Some(0)).await.unwrap().is_empty());

    let admin = store.get_user(SUPER_ADMIN_USER_ID, GUILD_A).await.unwrap().unwrap();
    assert_eq!(admin.chi, 777);
    assert_eq!(store.get_user(PLAYER, GUILD_A).await.unwrap().unwrap().chi, 100);
    assert_eq!(store.get_inventory(PLAYER, GUILD_A).await.unwrap().len(), 2);
    assert!(store.get_team(1, GUILD_A).await.unwrap().is_some());

    store.disconnect().await;
    cleanup(&db_path);
}
