//! Workspace lifecycle: registration, eviction and shutdown cleanup.

mod common;

use std::sync::Arc;
use std::thread;

use common::{count_entries, create_archive, manager};
use zipspace::{
    EvictError, MutexSet, WorkspaceConfig, WorkspaceId, WorkspaceManager, WorkspaceRegistry,
    WorkspaceSet,
};

#[test]
fn test_shutdown_removes_every_workspace() {
    let (_dir, manager) = manager();
    for i in 0..5 {
        let name = format!("file{i}.txt");
        manager
            .extract(&create_archive(&[(name.as_str(), b"data" as &[u8])]))
            .unwrap();
    }
    assert_eq!(manager.active().len(), 5);

    let report = manager.shutdown();
    assert_eq!(report.removed, 5);
    assert!(report.is_clean());
    assert!(manager.active().is_empty());
    assert_eq!(count_entries(manager.base_directory()), 0);

    // A second shutdown has nothing left to do.
    assert_eq!(manager.shutdown().removed, 0);
}

#[test]
fn test_shutdown_leaves_foreign_directories() {
    let (_dir, manager) = manager();
    manager
        .extract(&create_archive(&[("a", b"a" as &[u8])]))
        .unwrap();
    let foreign = manager.base_directory().join("not-a-workspace");
    std::fs::create_dir(&foreign).unwrap();

    manager.shutdown();
    assert!(foreign.is_dir());
    assert_eq!(count_entries(manager.base_directory()), 1);
}

#[test]
fn test_shutdown_tolerates_externally_removed_workspace() {
    let (_dir, manager) = manager();
    let gone = manager
        .extract(&create_archive(&[("a", b"a" as &[u8])]))
        .unwrap();
    let kept = manager
        .extract(&create_archive(&[("b", b"b" as &[u8])]))
        .unwrap();
    std::fs::remove_dir_all(gone.root_in(manager.base_directory())).unwrap();

    let report = manager.shutdown();
    assert_eq!(report.removed, 2);
    assert!(!kept.root_in(manager.base_directory()).exists());
}

#[test]
fn test_evict_unregistered_directory() {
    let (_dir, manager) = manager();
    let stray = WorkspaceId::new();
    std::fs::create_dir(stray.root_in(manager.base_directory())).unwrap();

    manager.evict(&stray).unwrap();
    assert!(!stray.root_in(manager.base_directory()).exists());
    assert!(matches!(
        manager.evict(&WorkspaceId::new()),
        Err(EvictError::NotFound(_))
    ));
}

#[test]
fn test_workspace_metadata() {
    let (_dir, manager) = manager();
    let extraction = manager
        .extract_with_report(&create_archive(&[("a", b"a" as &[u8])]))
        .unwrap();
    let id = extraction.workspace.id;

    let workspace = manager.workspace(&id).unwrap();
    assert_eq!(workspace.root, extraction.workspace.root);

    manager.evict(&id).unwrap();
    assert!(manager.workspace(&id).is_none());
}

#[test]
fn test_ids_parse_from_display() {
    let (_dir, manager) = manager();
    let id = manager
        .extract(&create_archive(&[("a.txt", b"a" as &[u8])]))
        .unwrap();

    let parsed: WorkspaceId = id.to_string().parse().unwrap();
    assert_eq!(manager.read(&parsed, "a.txt").unwrap(), "a");
}

#[test]
fn test_concurrent_extractions() {
    let (_dir, manager) = manager();
    let manager = Arc::new(manager);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let body = format!("thread {i}");
                let id = manager
                    .extract(&create_archive(&[("t.txt", body.as_bytes())]))
                    .unwrap();
                assert_eq!(manager.read(&id, "t.txt").unwrap(), body);
                id
            })
        })
        .collect();
    let mut ids: Vec<WorkspaceId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort();

    assert_eq!(manager.active(), ids);
    assert_eq!(manager.shutdown().removed, 8);
}

#[test]
fn test_custom_registry_set() {
    struct Recording {
        inner: MutexSet,
        inserted: Arc<std::sync::Mutex<Vec<WorkspaceId>>>,
    }

    impl WorkspaceSet for Recording {
        fn insert(&self, id: WorkspaceId) -> bool {
            self.inserted.lock().unwrap().push(id);
            self.inner.insert(id)
        }
        fn remove(&self, id: &WorkspaceId) -> bool {
            self.inner.remove(id)
        }
        fn contains(&self, id: &WorkspaceId) -> bool {
            self.inner.contains(id)
        }
        fn snapshot(&self) -> Vec<WorkspaceId> {
            self.inner.snapshot()
        }
        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    let inserted = Arc::new(std::sync::Mutex::new(Vec::new()));
    let dir = tempfile::TempDir::new().unwrap();
    let config = WorkspaceConfig::default().workspace_base_directory(dir.path());
    let manager = WorkspaceManager::with_registry(
        config,
        WorkspaceRegistry::with_set(Recording {
            inner: MutexSet::new(),
            inserted: Arc::clone(&inserted),
        }),
    )
    .unwrap();

    let id = manager
        .extract(&create_archive(&[("a", b"a" as &[u8])]))
        .unwrap();
    // An unsafe archive registers its id and rolls it back; a corrupt one
    // never gets that far.
    assert!(manager.extract(&create_archive(&[("../x", b"x" as &[u8])])).is_err());
    assert!(manager.extract(b"not a zip").is_err());

    assert_eq!(manager.active(), vec![id]);
    assert_eq!(manager.registry().len(), 1);
    assert_eq!(inserted.lock().unwrap().len(), 2);
}
