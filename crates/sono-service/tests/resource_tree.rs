//! Integration tests for the resource tree engine.

mod helpers;

use std::path::Path;

use sono_core::error::ErrorKind;
use sono_core::types::{ListRequest, ParentRef, ResourceId, UserId};
use sono_storage::hash::digest;
use sono_storage::stream_bytes;

use helpers::{TestApp, exists, request};

#[tokio::test]
async fn test_create_directory_twice_conflicts() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let parent = storage.id.to_string();

    let first = app.mkdir(&storage, &parent, "docs").await;
    let err = app
        .resources
        .create_resource(request(&storage, &parent, "docs", true), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(app.resource_repo.len().await, 1);
    assert!(first.is_directory);
    assert_eq!(first.content_hash, None);
    assert_eq!(first.path, storage.root().join("docs").to_string_lossy());
    assert!(exists(&first.path));
}

#[tokio::test]
async fn test_create_file_records_hash_and_extension() {
    let app = TestApp::new();
    let storage = app.create_storage().await;

    let file = app.write(&storage, &storage.id.to_string(), "a.txt", "hello").await;

    assert!(!file.is_directory);
    assert_eq!(file.extension.as_deref(), Some("txt"));
    assert_eq!(file.media_type.as_deref(), Some("text/plain"));
    assert_eq!(file.content_hash, Some(digest(b"hello")));
    assert_eq!(file.bytes_count, 5);
    assert_eq!(file.version, 1);
    assert_eq!(std::fs::read(&file.path).unwrap(), b"hello");
}

#[tokio::test]
async fn test_create_rejects_bad_arguments() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let parent = storage.id.to_string();

    let err = app
        .resources
        .create_resource(request(&storage, &parent, "a.txt", false), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let mut bad_parent = request(&storage, "", "x", true);
    let err = app.resources.create_resource(bad_parent.clone(), None).await.unwrap_err();
    assert_eq!(err.message, "parent_id cannot be empty");

    bad_parent.parent_id = storage.user_id.to_string();
    let err = app.resources.create_resource(bad_parent, None).await.unwrap_err();
    assert_eq!(err.message, "parent_id is incorrect");

    let err = app
        .resources
        .create_resource(request(&storage, &parent, "", true), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(app.resource_repo.len().await, 0);
}

#[tokio::test]
async fn test_create_resolves_parent_state() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let file = app.write(&storage, &storage.id.to_string(), "f.txt", "x").await;

    let err = app
        .resources
        .create_resource(request(&storage, &file.id.to_string(), "child", true), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let missing = ResourceId::new().to_string();
    let err = app
        .resources
        .create_resource(request(&storage, &missing, "child", true), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let dir = app.mkdir(&storage, &storage.id.to_string(), "dir").await;
    app.resources.trash_resource(&dir.id.to_string()).await.unwrap();
    let err = app
        .resources
        .create_resource(request(&storage, &dir.id.to_string(), "child", true), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_create_rejects_foreign_parent() {
    let app = TestApp::new();
    let mine = app.create_storage().await;
    let theirs = app.create_storage().await;

    let mut req = request(&mine, &theirs.id.to_string(), "intruder", true);
    req.user_id = mine.user_id.to_string();
    let err = app.resources.create_resource(req, None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_trash_then_restore_round_trip() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    let dir = app.mkdir(&storage, &root, "docs").await;
    let nested = app.write(&storage, &dir.id.to_string(), "a.txt", "a").await;
    let sibling = app.write(&storage, &root, "keep.txt", "k").await;
    let original_path = dir.path.clone();

    let trashed = app.resources.trash_resource(&dir.id.to_string()).await.unwrap();
    assert!(trashed.is_trashed);
    assert_eq!(trashed.name, "docs");
    assert_eq!(trashed.parent_id, ParentRef::Storage(storage.id));
    assert_eq!(Path::new(&trashed.path), storage.subdirectory("trash").join("docs"));
    assert!(!exists(&original_path));

    let nested_trashed = app.reload(&nested).await;
    assert!(nested_trashed.is_trashed);
    assert_eq!(
        Path::new(&nested_trashed.path),
        storage.subdirectory("trash").join("docs/a.txt")
    );
    assert!(exists(&nested_trashed.path));

    let restored = app.resources.restore_resource(&dir.id.to_string()).await.unwrap();
    assert!(!restored.is_trashed);
    assert_eq!(restored.path, original_path);

    let nested_restored = app.reload(&nested).await;
    assert!(!nested_restored.is_trashed);
    assert_eq!(nested_restored.path, nested.path);
    assert_eq!(app.reload(&sibling).await, sibling);
}

#[tokio::test]
async fn test_trash_state_checks() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let file = app.write(&storage, &storage.id.to_string(), "a.txt", "a").await;
    let id = file.id.to_string();

    let err = app.resources.restore_resource(&id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    app.resources.trash_resource(&id).await.unwrap();
    let err = app.resources.trash_resource(&id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    for op in [
        app.resources.copy_resource(&id).await.unwrap_err(),
        app.resources.rename_resource(&id, "b.txt").await.unwrap_err(),
        app.resources
            .move_resource(&id, &storage.id.to_string())
            .await
            .unwrap_err(),
    ] {
        assert_eq!(op.kind, ErrorKind::Conflict);
    }
}

#[tokio::test]
async fn test_trash_collision_gets_suffix_and_blocks_restore() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();

    let first = app.write(&storage, &root, "a.txt", "one").await;
    app.resources.trash_resource(&first.id.to_string()).await.unwrap();
    let second = app.write(&storage, &root, "a.txt", "two").await;
    let second = app.resources.trash_resource(&second.id.to_string()).await.unwrap();

    let file_name = Path::new(&second.path)
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert_ne!(file_name, "a.txt");
    assert!(file_name.starts_with("a ") && file_name.ends_with(".txt"));
    assert_eq!(second.name, "a.txt");

    app.resources.restore_resource(&first.id.to_string()).await.unwrap();
    let err = app
        .resources
        .restore_resource(&second.id.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(std::fs::read(&second.path).unwrap(), b"two");
}

#[tokio::test]
async fn test_restore_into_trashed_parent_conflicts() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let dir = app.mkdir(&storage, &storage.id.to_string(), "dir").await;
    let file = app.write(&storage, &dir.id.to_string(), "f.txt", "f").await;

    app.resources.trash_resource(&file.id.to_string()).await.unwrap();
    app.resources.trash_resource(&dir.id.to_string()).await.unwrap();

    let err = app
        .resources
        .restore_resource(&file.id.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_copy_numbering() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let file = app.write(&storage, &storage.id.to_string(), "a.txt", "data").await;
    let id = file.id.to_string();

    let first = app.resources.copy_resource(&id).await.unwrap();
    let second = app.resources.copy_resource(&id).await.unwrap();
    let third = app.resources.copy_resource(&id).await.unwrap();

    assert_eq!(first.name, "a copy.txt");
    assert_eq!(second.name, "a copy 2.txt");
    assert_eq!(third.name, "a copy 3.txt");
    assert_ne!(first.id, file.id);
    assert_eq!(first.parent_id, file.parent_id);
    assert_eq!(first.content_hash, file.content_hash);
    assert_eq!(first.version, 1);
    assert_eq!(first.last_updated_at, None);
    assert!(exists(&third.path));
}

#[tokio::test]
async fn test_copy_directory_duplicates_descendants() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let dir = app.mkdir(&storage, &storage.id.to_string(), "src").await;
    let sub = app.mkdir(&storage, &dir.id.to_string(), "sub").await;
    let leaf = app.write(&storage, &sub.id.to_string(), "leaf.txt", "leaf").await;

    let copy = app.resources.copy_resource(&dir.id.to_string()).await.unwrap();
    assert_eq!(copy.name, "src copy");
    assert!(copy.is_directory);
    assert_eq!(copy.bytes_count, 4);
    assert_eq!(app.resource_repo.len().await, 6);

    let page = app
        .resources
        .list_resources(&ListRequest::default().filter("parent_id", copy.id.to_string()))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    let sub_copy = &page.items[0];
    assert_eq!(sub_copy.name, "sub");
    assert_ne!(sub_copy.id, sub.id);

    let page = app
        .resources
        .list_resources(&ListRequest::default().filter("parent_id", sub_copy.id.to_string()))
        .await
        .unwrap();
    let leaf_copy = &page.items[0];
    assert_eq!(leaf_copy.content_hash, leaf.content_hash);
    assert_eq!(
        Path::new(&leaf_copy.path),
        Path::new(&copy.path).join("sub/leaf.txt")
    );
}

#[tokio::test]
async fn test_move_rebases_every_descendant() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    let a = app.mkdir(&storage, &root, "a").await;
    let b = app.mkdir(&storage, &a.id.to_string(), "b").await;
    let c = app.write(&storage, &b.id.to_string(), "c.txt", "c").await;
    let target = app.mkdir(&storage, &root, "target").await;

    let moved = app
        .resources
        .move_resource(&a.id.to_string(), &target.id.to_string())
        .await
        .unwrap();
    assert_eq!(moved.parent_id, ParentRef::Resource(target.id));
    assert_eq!(Path::new(&moved.path), Path::new(&target.path).join("a"));

    let b_moved = app.reload(&b).await;
    let c_moved = app.reload(&c).await;
    assert_eq!(Path::new(&b_moved.path), Path::new(&moved.path).join("b"));
    assert_eq!(Path::new(&c_moved.path), Path::new(&moved.path).join("b/c.txt"));
    assert_eq!(b_moved.parent_id, ParentRef::Resource(a.id));
    assert!(exists(&c_moved.path));
    assert!(!exists(&c.path));
}

#[tokio::test]
async fn test_move_rejects_cycles_and_collisions() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    let a = app.mkdir(&storage, &root, "a").await;
    let b = app.mkdir(&storage, &a.id.to_string(), "b").await;
    app.mkdir(&storage, &b.id.to_string(), "a").await;

    let err = app
        .resources
        .move_resource(&a.id.to_string(), &a.id.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = app
        .resources
        .move_resource(&a.id.to_string(), &b.id.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let other = app.mkdir(&storage, &root, "other").await;
    app.mkdir(&storage, &other.id.to_string(), "b").await;
    let err = app
        .resources
        .move_resource(&b.id.to_string(), &other.id.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(exists(&b.path));
}

#[tokio::test]
async fn test_rename_updates_extension_and_descendants() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    let file = app.write(&storage, &root, "notes.txt", "n").await;
    let dir = app.mkdir(&storage, &root, "dir").await;
    let inner = app.write(&storage, &dir.id.to_string(), "in.txt", "i").await;

    let renamed = app
        .resources
        .rename_resource(&file.id.to_string(), "notes.csv")
        .await
        .unwrap();
    assert_eq!(renamed.extension.as_deref(), Some("csv"));
    assert_eq!(renamed.media_type.as_deref(), Some("text/csv"));
    assert_eq!(renamed.version, 2);
    assert!(renamed.last_updated_at.is_some());

    let dir = app
        .resources
        .rename_resource(&dir.id.to_string(), "folder")
        .await
        .unwrap();
    let inner = app.reload(&inner).await;
    assert_eq!(Path::new(&inner.path), Path::new(&dir.path).join("in.txt"));
    assert!(exists(&inner.path));

    let err = app
        .resources
        .rename_resource(&renamed.id.to_string(), &"x".repeat(256))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    app.write(&storage, &root, "taken.md", "t").await;
    let err = app
        .resources
        .rename_resource(&renamed.id.to_string(), "taken.md")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_compress_then_extract_round_trip() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    let docs = app.mkdir(&storage, &root, "docs").await;
    let a = app.write(&storage, &docs.id.to_string(), "a.txt", "alpha").await;
    let sub = app.mkdir(&storage, &docs.id.to_string(), "sub").await;
    let b = app.write(&storage, &sub.id.to_string(), "b.txt", "beta").await;
    let c = app.write(&storage, &root, "c.md", "gamma").await;

    let archive = app
        .resources
        .compress_resources(
            &[docs.id.to_string(), c.id.to_string()],
            &root,
            "bundle.zip",
        )
        .await
        .unwrap();
    assert!(!archive.is_directory);
    assert_eq!(archive.extension.as_deref(), Some("zip"));
    assert_eq!(archive.media_type.as_deref(), Some("application/zip"));
    assert!(archive.content_hash.is_some());

    let out = app.mkdir(&storage, &root, "out").await;
    let extracted = app
        .resources
        .extract_resource(&archive.id.to_string(), &out.id.to_string())
        .await
        .unwrap();

    let mut names: Vec<_> = extracted.iter().map(|r| r.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["c.md", "docs"]);
    assert!(extracted.iter().all(|r| r.parent_id == ParentRef::Resource(out.id)));

    let hash_of = |name: &str| {
        let app = &app;
        let name = name.to_string();
        async move {
            app.resources
                .list_resources(
                    &ListRequest::default()
                        .filter("name", name)
                        .filter("is_trashed", "false"),
                )
                .await
                .unwrap()
                .items
                .into_iter()
                .map(|r| r.content_hash)
                .collect::<Vec<_>>()
        }
    };
    assert_eq!(hash_of("a.txt").await, vec![a.content_hash.clone(); 2]);
    assert_eq!(hash_of("b.txt").await, vec![b.content_hash.clone(); 2]);
    assert_eq!(hash_of("c.md").await, vec![c.content_hash.clone(); 2]);

    let extracted_b = Path::new(&out.path).join("docs/sub/b.txt");
    assert_eq!(std::fs::read(extracted_b).unwrap(), b"beta");
    // docs, a.txt, sub, b.txt, c.md, archive, out, plus five extracted rows
    assert_eq!(app.resource_repo.len().await, 12);
}

#[tokio::test]
async fn test_compress_argument_and_state_checks() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    let dir = app.mkdir(&storage, &root, "dir").await;
    let inner = app.mkdir(&storage, &dir.id.to_string(), "inner").await;

    let err = app
        .resources
        .compress_resources(&[], &root, "x.zip")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .resources
        .compress_resources(&[dir.id.to_string()], &dir.id.to_string(), "x.zip")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = app
        .resources
        .compress_resources(&[dir.id.to_string()], &inner.id.to_string(), "x.zip")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    app.write(&storage, &root, "x.zip", "taken").await;
    let err = app
        .resources
        .compress_resources(&[dir.id.to_string()], &root, "x.zip")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_extract_rejects_collisions_and_non_archives() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    let file = app.write(&storage, &root, "a.txt", "a").await;

    let archive = app
        .resources
        .compress_resources(&[file.id.to_string()], &root, "a.zip")
        .await
        .unwrap();

    let err = app
        .resources
        .extract_resource(&archive.id.to_string(), &root)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(std::fs::read(&file.path).unwrap(), b"a");

    let err = app
        .resources
        .extract_resource(&file.id.to_string(), &root)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    app.resources.trash_resource(&archive.id.to_string()).await.unwrap();
    let err = app
        .resources
        .extract_resource(&archive.id.to_string(), &root)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_remove_deletes_subtree_and_records() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    let dir = app.mkdir(&storage, &root, "dir").await;
    app.write(&storage, &dir.id.to_string(), "a.txt", "a").await;
    let loose = app.write(&storage, &dir.id.to_string(), "b.txt", "b").await;
    let loose = app.resources.trash_resource(&loose.id.to_string()).await.unwrap();
    let other = app.write(&storage, &root, "other.txt", "o").await;

    app.resources.remove_resource(&dir.id.to_string()).await.unwrap();

    assert!(!exists(&dir.path));
    assert!(!exists(&loose.path));
    assert_eq!(app.resource_repo.len().await, 1);
    assert_eq!(app.reload(&other).await.id, other.id);

    let err = app
        .resources
        .get_resource(&dir.id.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_resources_contract() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    for name in ["c.txt", "a.txt", "b.txt"] {
        app.write(&storage, &root, name, "x").await;
    }

    let page = app
        .resources
        .list_resources(&ListRequest {
            page: Some(1),
            page_size: Some(2),
            sort_property: Some("name".into()),
            sort_order: Some("desc".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let names: Vec<_> = page.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["c.txt", "b.txt"]);
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);

    let err = app
        .resources
        .list_resources(&ListRequest {
            page: Some(3),
            page_size: Some(2),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    for bad in [
        ListRequest {
            page_size: Some(1001),
            ..Default::default()
        },
        ListRequest {
            sort_property: Some("path".into()),
            ..Default::default()
        },
        ListRequest::default().filter("description", "x"),
        ListRequest::default().filter("user_id", UserId::new().to_string() + "x"),
        ListRequest {
            page: Some(i64::MAX),
            page_size: Some(1000),
            ..Default::default()
        },
    ] {
        let err = app.resources.list_resources(&bad).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}

#[tokio::test]
async fn test_update_description() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let file = app.write(&storage, &storage.id.to_string(), "a.txt", "a").await;
    let id = file.id.to_string();

    let updated = app
        .resources
        .update_description(&id, Some("quarterly report".into()))
        .await
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("quarterly report"));

    let cleared = app
        .resources
        .update_description(&id, Some("  ".into()))
        .await
        .unwrap();
    assert_eq!(cleared.description, None);

    let err = app
        .resources
        .update_description(&id, Some("d".repeat(1025)))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_open_content_of_file_and_directory() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let root = storage.id.to_string();
    let file = app.write(&storage, &root, "a.txt", "alpha").await;
    let dir = app.mkdir(&storage, &root, "dir").await;
    app.write(&storage, &dir.id.to_string(), "b.txt", "beta").await;

    let content = app.resources.open_content(&file.id.to_string()).await.unwrap();
    assert!(!content.temporary);
    assert_eq!(content.bytes_count, 5);
    assert_eq!(content.path, Path::new(&file.path));

    let content = app.resources.open_content(&dir.id.to_string()).await.unwrap();
    assert!(content.temporary);
    assert!(content.name.starts_with("dir ") && content.name.ends_with(".zip"));
    assert!(content.path.starts_with(storage.subdirectory("temporary")));
    assert!(sono_storage::archive::is_archive(content.path.clone()).await.unwrap());

    let removed = app.storages.clear_temporary(&root).await.unwrap();
    assert_eq!(removed, 1);
    assert!(!exists(&content.path));
}

#[tokio::test]
async fn test_create_file_from_stream_chunks() {
    let app = TestApp::new();
    let storage = app.create_storage().await;
    let chunks: Vec<std::io::Result<bytes::Bytes>> = vec![Ok(bytes_from("ab")), Ok(bytes_from("cd"))];
    let stream: sono_storage::ByteStream = Box::pin(futures::stream::iter(chunks));

    let file = app
        .resources
        .create_resource(request(&storage, &storage.id.to_string(), "abcd", false), Some(stream))
        .await
        .unwrap();
    assert_eq!(file.extension, None);
    assert_eq!(file.bytes_count, 4);
    assert_eq!(file.content_hash, Some(digest(b"abcd")));

    let single = app
        .resources
        .create_resource(
            request(&storage, &storage.id.to_string(), ".env", false),
            Some(stream_bytes("K=V")),
        )
        .await
        .unwrap();
    assert_eq!(single.extension, None);
}

fn bytes_from(text: &'static str) -> bytes::Bytes {
    bytes::Bytes::from_static(text.as_bytes())
}
