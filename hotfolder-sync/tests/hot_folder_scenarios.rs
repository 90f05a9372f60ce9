//! End-to-end processor scenarios on a real temporary directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use hotfolder_core::{ActionKind, ActionRecord, FsEvent, FsOp, MonitorConfig, OsFs};
use hotfolder_sync::{audit, EventProcessor, TrackingStore};
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup(root: &TempDir) -> (MonitorConfig, EventProcessor) {
    init_logging();
    let config = MonitorConfig::rooted_at(root.path());
    fs::create_dir_all(&config.hot_dir).expect("create hot dir");
    fs::create_dir_all(&config.backup_dir).expect("create backup dir");
    let processor = EventProcessor::open(Arc::new(OsFs), &config);
    (config, processor)
}

fn records(config: &MonitorConfig) -> Vec<ActionRecord> {
    fs::read_to_string(&config.log_file)
        .expect("read audit log")
        .lines()
        .map(|line| line.parse().expect("well-formed record"))
        .collect()
}

#[test]
fn created_file_is_mirrored_and_audited() {
    let root = TempDir::new().expect("root");
    let (config, mut processor) = setup(&root);
    let report = config.hot_path("report.txt");
    fs::write(&report, "X").expect("write report");

    processor.handle(&FsEvent::new(FsOp::Create, &report));

    let backup = config.backup_dir.join("report.txt.bak");
    assert_eq!(fs::read_to_string(backup).expect("backup"), "X");

    let lines: Vec<String> = records(&config).iter().map(ToString::to_string).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(&format!("CREATED {}", report.display())));
    assert!(lines[1].ends_with(&format!("BACKUP {}", report.display())));
}

#[test]
fn delete_request_clears_hot_copy_and_backup() {
    let root = TempDir::new().expect("root");
    let (config, mut processor) = setup(&root);
    let report = config.hot_path("report.txt");
    fs::write(&report, "X").expect("write report");
    processor.handle(&FsEvent::new(FsOp::Create, &report));

    let sentinel = config.hot_path("delete_report.txt");
    fs::write(&sentinel, "").expect("write sentinel");
    processor.handle(&FsEvent::new(FsOp::Create, &sentinel));

    assert!(!report.exists(), "hot copy must be gone");
    assert!(!sentinel.exists(), "sentinel must be gone");
    assert!(!config.backup_dir.join("report.txt.bak").exists());

    let last = records(&config).pop().expect("records");
    assert_eq!(last.action, ActionKind::Delete);
    assert_eq!(last.path, sentinel);
}

#[test]
fn rename_removes_obsolete_backup_and_tracking_entry() {
    let root = TempDir::new().expect("root");
    let (config, mut processor) = setup(&root);
    let old = config.hot_path("old.txt");
    fs::write(&old, "O").expect("write old");
    processor.handle(&FsEvent::new(FsOp::Create, &old));
    assert!(config.backup_dir.join("old.txt.bak").exists());

    let new = config.hot_path("new.txt");
    fs::rename(&old, &new).expect("rename");
    processor.handle(&FsEvent::new(FsOp::Rename, &old));
    processor.handle(&FsEvent::new(FsOp::Create, &new));

    assert!(!config.backup_dir.join("old.txt.bak").exists());
    assert_eq!(
        fs::read_to_string(config.backup_dir.join("new.txt.bak")).expect("new backup"),
        "O"
    );

    let persisted = TrackingStore::new(Arc::new(OsFs), config.state_file.clone())
        .try_load()
        .expect("load state");
    assert!(!persisted.contains(&old));
    assert!(persisted.contains(&new));
}

#[test]
fn filter_matches_only_backup_lines() {
    let root = TempDir::new().expect("root");
    let (config, mut processor) = setup(&root);
    for name in ["a.txt", "b.txt"] {
        let path = config.hot_path(name);
        fs::write(&path, name).expect("write");
        processor.handle(&FsEvent::new(FsOp::Create, &path));
    }

    let lines = audit::filter_log(&OsFs, &config.log_file, " BACKUP ").expect("filter");

    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.contains(" BACKUP ")));
    assert!(Path::new(&config.log_file).exists());
}
