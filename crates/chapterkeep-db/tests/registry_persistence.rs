//! The registry store against an on-disk database.

use std::sync::Arc;

use chapterkeep_core::testing::FakeFetcher;
use chapterkeep_core::{OfflineRegistry, PermissionRecord, RegistryStorePort};
use chapterkeep_db::{SqliteRegistryStore, setup_database};

#[tokio::test]
async fn test_registry_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chapterkeep.db");

    {
        let store = SqliteRegistryStore::new(setup_database(&path).await.unwrap());
        store.save_ids(&[4, 2, 9]).await.unwrap();
        store.save_permission(&PermissionRecord::now(true)).await.unwrap();
    }

    let store = SqliteRegistryStore::new(setup_database(&path).await.unwrap());
    assert_eq!(store.load_ids().await.unwrap(), vec![4, 2, 9]);
    assert!(store.load_permission().await.unwrap().is_some_and(|r| r.granted));
}

#[tokio::test]
async fn test_reconcile_rewrites_persisted_list() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chapterkeep.db");
    let store = Arc::new(SqliteRegistryStore::new(setup_database(&path).await.unwrap()));
    store.save_ids(&[1, 2, 3]).await.unwrap();

    let fetcher = Arc::new(FakeFetcher::new().with_stored(&[1, 2, 3]));
    fetcher.corrupt(2);

    let registry = OfflineRegistry::new(store.clone(), fetcher);
    assert_eq!(registry.reconcile().await, vec![1, 3]);

    let reopened = SqliteRegistryStore::new(setup_database(&path).await.unwrap());
    assert_eq!(reopened.load_ids().await.unwrap(), vec![1, 3]);
}

#[tokio::test]
async fn test_registry_mutations_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chapterkeep.db");
    let store = Arc::new(SqliteRegistryStore::new(setup_database(&path).await.unwrap()));
    let fetcher = Arc::new(FakeFetcher::new().with_stored(&[7, 8]));

    let registry = OfflineRegistry::new(store.clone(), fetcher);
    registry.add(7).await.unwrap();
    registry.add(8).await.unwrap();
    registry.remove(7).await.unwrap();

    assert_eq!(store.load_ids().await.unwrap(), vec![8]);
    registry.clear_all().await.unwrap();
    assert!(store.load_ids().await.unwrap().is_empty());
}
