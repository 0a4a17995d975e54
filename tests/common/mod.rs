#![allow(dead_code)]

use rustmemodb_restore::storage::{StoreMetadata, create_classic_store};
use rustmemodb_restore::{RecordFormat, TargetStore};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATABASE: &str = "graph.db";

/// Writes a checkpointed classic store that can serve as a backup.
pub fn write_backup(dir: &Path, format: RecordFormat) -> StoreMetadata {
    let mut tables = BTreeMap::new();
    tables.insert(
        "users".to_string(),
        vec![b"1|Alice|30".to_vec(), b"2|Bob|25".to_vec()],
    );
    tables.insert("orders".to_string(), vec![b"100|1|42.50".to_vec()]);
    create_classic_store(dir, format, 3, tables).unwrap()
}

pub fn target(home: &Path, format: RecordFormat) -> TargetStore {
    TargetStore::new(home, DATABASE, format).unwrap()
}

/// Every file under `root` keyed by relative path, with its bytes.
pub fn dir_contents(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut out = BTreeMap::new();
    collect(root, root, &mut out);
    out
}

fn collect(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_path_buf();
            out.insert(rel, fs::read(&path).unwrap());
        }
    }
}
