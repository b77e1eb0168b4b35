use horreum::{ArtifactCreate, StateStore, StoreConfig};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const GUILD: i64 = 44_400;

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

fn relic(id: &str) -> ArtifactCreate {
    ArtifactCreate {
        artifact_id: id.to_string(),
        tier: "legendary".to_string(),
        emoji: "🏺".to_string(),
        name: "Amphora of Dawn".to_string(),
    }
}

#[tokio::test]
async fn artifact_ids_are_unique_across_every_guild() {
    let db_path = temp_db_path("test_artifacts");
    let store = StateStore::connect(&StoreConfig::embedded(&db_path))
        .await
        .unwrap();

    // 1. The first grant takes the id.
    assert!(store.add_artifact(1, GUILD, &relic("amphora-001")).await.unwrap());

    // 2. The same id granted again, even to someone else in another guild,
    //    is a silent no-op and the original owner keeps it.
    assert!(
        !store
            .add_artifact(2, GUILD + 1, &relic("amphora-001"))
            .await
            .unwrap(),
        "Expected the duplicate grant to be refused"
    );
    let owned = store.get_artifacts(1, GUILD).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].artifact_id, "amphora-001");
    assert_eq!(owned[0].tier, "legendary");
    assert!(store.get_artifacts(2, GUILD + 1).await.unwrap().is_empty());

    store.disconnect().await;
    cleanup(&db_path);
}

#[tokio::test]
async fn removal_only_reaches_the_owner_in_the_owning_partition() {
    let db_path = temp_db_path("test_artifacts_remove");
    let store = StateStore::connect(&StoreConfig::embedded(&db_path))
        .await
        .unwrap();

    store.add_artifact(1, GUILD, &relic("vase-007")).await.unwrap();

    // 1. Someone else (or another partition) cannot remove it.
    assert!(!store.remove_artifact(2, GUILD, "vase-007").await.unwrap());
    assert!(!store.remove_artifact(1, GUILD + 1, "vase-007").await.unwrap());
    assert_eq!(store.get_artifacts(1, GUILD).await.unwrap().len(), 1);

    // 2. The owner can, exactly once.
    assert!(store.remove_artifact(1, GUILD, "vase-007").await.unwrap());
    assert!(!store.remove_artifact(1, GUILD, "vase-007").await.unwrap());
    assert!(store.get_artifacts(1, GUILD).await.unwrap().is_empty());

    store.disconnect().await;
    cleanup(&db_path);
}
