//! Integration tests for the storage lifecycle.

mod helpers;

use std::path::Path;

use sono_core::error::ErrorKind;
use sono_core::types::{ListRequest, StorageId, UserId};
use sono_storage::hash::digest;

use helpers::{TestApp, exists};

#[tokio::test]
async fn test_create_storage_lays_out_directories() {
    let app = TestApp::new();
    let user = UserId::new();

    let storage = app.storages.create_storage(&user.to_string()).await.unwrap();

    let expected = app.root.path().join(digest(user.to_string().as_bytes()));
    assert_eq!(storage.root(), expected.as_path());
    assert_eq!(storage.user_id, user);
    assert_eq!(storage.version, 1);
    assert!(storage.subdirectory("trash").is_dir());
    assert!(storage.subdirectory("temporary").is_dir());

    let err = app.storages.create_storage(&user.to_string()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_create_storage_validates_user_id() {
    let app = TestApp::new();

    let err = app.storages.create_storage("").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .storages
        .create_storage(&StorageId::new().to_string())
        .await
        .unwrap_err();
    assert_eq!(err.message, "user_id is incorrect");
}

#[tokio::test]
async fn test_lookups() {
    let app = TestApp::new();
    let storage = app.create_storage().await;

    let by_id = app.storages.get_storage(&storage.id.to_string()).await.unwrap();
    let by_user = app
        .storages
        .get_storage_by_user(&storage.user_id.to_string())
        .await
        .unwrap();
    assert_eq!(by_id, storage);
    assert_eq!(by_user, storage);

    let err = app
        .storages
        .get_storage(&StorageId::new().to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = app
        .storages
        .get_storage(&storage.user_id.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_list_storages_filters_by_user() {
    let app = TestApp::new();
    let first = app.create_storage().await;
    app.create_storage().await;
    app.create_storage().await;

    let all = app.storages.list_storages(&ListRequest::default()).await.unwrap();
    assert_eq!(all.total_items, 3);

    let page = app
        .storages
        .list_storages(&ListRequest::default().filter("user_id", first.user_id.to_string()))
        .await
        .unwrap();
    assert_eq!(page.items, vec![first]);

    let err = app
        .storages
        .list_storages(&ListRequest::default().filter("path", "/x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_remove_storage_cascades() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let keep = app.create_storage().await;
    let dir = app.mkdir(&storage, &storage.id.to_string(), "dir").await;
    app.write(&storage, &dir.id.to_string(), "a.txt", "a").await;
    app.write(&keep, &keep.id.to_string(), "b.txt", "b").await;

    app.storages.remove_storage(&storage.id.to_string()).await.unwrap();

    assert!(!exists(storage.root()));
    assert_eq!(app.resource_repo.len().await, 1);
    let err = app
        .storages
        .get_storage(&storage.id.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // The user can start over.
    let again = app
        .storages
        .create_storage(&storage.user_id.to_string())
        .await
        .unwrap();
    assert_ne!(again.id, storage.id);
    assert_eq!(again.path, storage.path);
}

#[tokio::test]
async fn test_verify_storage_reports_divergence() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    let file = app.write(&storage, &root, "a.txt", "a").await;
    let trashed = app.write(&storage, &root, "t.txt", "t").await;
    app.resources.trash_resource(&trashed.id.to_string()).await.unwrap();

    let report = app.storages.verify_storage(&root).await.unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.checked_resources, 2);

    std::fs::remove_file(&file.path).unwrap();
    std::fs::write(storage.root().join("stray.bin"), b"?").unwrap();
    std::fs::write(storage.subdirectory("temporary").join("scratch.zip"), b"?").unwrap();

    let report = app.storages.verify_storage(&root).await.unwrap();
    assert_eq!(report.missing_on_disk, vec![file.id]);
    assert_eq!(report.untracked_paths, vec![storage.root().join("stray.bin")]);
}

#[tokio::test]
async fn test_scenario_file_trash_and_restore() {
    let app = TestApp::new();
    let user = UserId::new();
    let storage = app.storages.create_storage(&user.to_string()).await.unwrap();
    assert!(Path::new(&storage.path).ends_with(digest(user.to_string().as_bytes())));

    let file = app.write(&storage, &storage.id.to_string(), "a.txt", "content").await;
    assert_eq!(file.extension.as_deref(), Some("txt"));
    assert!(!file.is_directory);
    assert!(file.content_hash.is_some());

    let trashed = app.resources.trash_resource(&file.id.to_string()).await.unwrap();
    assert!(trashed.is_trashed);
    assert!(Path::new(&trashed.path).starts_with(storage.subdirectory("trash")));
    assert!(exists(&trashed.path));
    assert!(!exists(&file.path));

    let restored = app.resources.restore_resource(&file.id.to_string()).await.unwrap();
    assert!(!restored.is_trashed);
    assert_eq!(restored.path, file.path);
    assert!(exists(&file.path));
}
