//! Fuzz target for full extraction of arbitrary payloads.
//!
//! Run with: cargo +nightly fuzz run extract
//!
//! The extractor must never panic, and every failed extraction must leave
//! the base directory empty. Successful workspaces are evicted right away.

#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use zipspace::{WorkspaceConfig, WorkspaceManager};

fn manager() -> &'static WorkspaceManager {
    static MANAGER: OnceLock<WorkspaceManager> = OnceLock::new();
    MANAGER.get_or_init(|| {
        let base = std::env::temp_dir().join(format!("zipspace-fuzz-{}", std::process::id()));
        let config = WorkspaceConfig::default()
            .workspace_base_directory(base)
            .max_entries(256)
            .max_total_bytes(16 * 1024 * 1024);
        WorkspaceManager::new(config).expect("fuzz base directory")
    })
}

fuzz_target!(|data: &[u8]| {
    let manager = manager();
    match manager.extract(data) {
        Ok(id) => {
            for path in manager.list(&id) {
                let _ = manager.read(&id, &path);
            }
            let _ = manager.search(&id, "PK");
            manager.evict(&id).expect("evict fuzz workspace");
        }
        Err(_) => {
            let residue = std::fs::read_dir(manager.base_directory())
                .map(|entries| entries.count())
                .unwrap_or(0);
            assert_eq!(residue, 0, "failed extraction left a workspace behind");
        }
    }
});
