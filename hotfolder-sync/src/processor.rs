//! Event processor: the hot-folder state machine.
//!
//! | op     | `delete_` name | audit records        | file operation   | tracking |
//! |--------|----------------|----------------------|------------------|----------|
//! | create | no             | `CREATED`, `BACKUP`  | backup           | touch    |
//! | create | yes            | `CREATED`, `DELETE`  | delete request   | touch    |
//! | write  | no             | `MODIFIED`, `BACKUP` | backup           | touch    |
//! | write  | yes            | `MODIFIED`, `DELETE` | delete request   | touch    |
//! | remove | -              | `DELETED`            | none             | evict    |
//! | rename | -              | `RENAMED`            | rename cleanup   | evict    |
//!
//! The intent record (`CREATED`, `MODIFIED`, ...) is appended before the file
//! operation runs. `BACKUP` is only recorded for a backup that succeeded.
//! Errors end the current event, never the processor.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use hotfolder_core::{ActionKind, FileSystem, FsEvent, FsOp, MonitorConfig};

use crate::action_log::ActionLogger;
use crate::backup::BackupStore;
use crate::tracking::{TrackingState, TrackingStore};

/// What [`EventProcessor::process`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The event was classified and tracking state changed.
    Applied(FsOp),
    /// The event path had no file name (`..`, a bare root) and was dropped.
    Ignored,
}

/// Owns the tracking state and drives backup, delete, and audit for each event.
#[derive(Debug)]
pub struct EventProcessor {
    backups: BackupStore,
    logger: ActionLogger,
    store: TrackingStore,
    state: TrackingState,
}

impl EventProcessor {
    /// Build a processor with empty tracking state.
    pub fn new(fs: Arc<dyn FileSystem>, config: &MonitorConfig) -> Self {
        Self {
            backups: BackupStore::new(fs.clone(), config.clone()),
            logger: ActionLogger::new(fs.clone(), config.log_file.clone()),
            store: TrackingStore::new(fs, config.state_file.clone()),
            state: TrackingState::default(),
        }
    }

    /// Build a processor and load the persisted tracking state.
    pub fn open(fs: Arc<dyn FileSystem>, config: &MonitorConfig) -> Self {
        let mut processor = Self::new(fs, config);
        processor.state = processor.store.load();
        tracing::info!(
            "loaded {} tracked file(s) from {}",
            processor.state.len(),
            processor.store.path().display()
        );
        processor
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    /// Process `event`, then persist tracking state if it changed.
    pub fn handle(&mut self, event: &FsEvent) -> Dispatch {
        let dispatch = self.process(event);
        if matches!(dispatch, Dispatch::Applied(_)) {
            self.commit();
        }
        dispatch
    }

    /// Apply `event` to the filesystem, audit log, and in-memory state.
    pub fn process(&mut self, event: &FsEvent) -> Dispatch {
        let Some(name) = event.file_name() else {
            tracing::warn!("ignoring {} event without file name: {:?}", event.op, event.path);
            return Dispatch::Ignored;
        };
        tracing::debug!("{} {}", event.op, Path::new(name).display());

        match event.op {
            FsOp::Create => self.on_upsert(event, ActionKind::Created),
            FsOp::Write => self.on_upsert(event, ActionKind::Modified),
            FsOp::Remove => {
                self.record(ActionKind::Deleted, &event.path);
                self.state.evict(&event.path);
            }
            FsOp::Rename => {
                self.record(ActionKind::Renamed, &event.path);
                match self.backups.rename_cleanup(&event.path) {
                    Ok(Some(backup)) => {
                        tracing::info!("removed obsolete backup {}", backup.display());
                    }
                    Ok(None) => {}
                    Err(err) => tracing::error!("rename cleanup failed: {err}"),
                }
                self.state.evict(&event.path);
            }
        }
        Dispatch::Applied(event.op)
    }

    /// Persist the current tracking state. Failures are logged, not retried.
    pub fn commit(&self) -> bool {
        match self.store.save(&self.state) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!("failed to save tracking state: {err}");
                false
            }
        }
    }

    fn on_upsert(&mut self, event: &FsEvent, intent: ActionKind) {
        self.record(intent, &event.path);

        if event.is_delete_request() {
            match self.backups.delete(&event.path) {
                Ok(report) => {
                    for removed in &report.removed {
                        tracing::info!("removed {}", removed.display());
                    }
                    for err in &report.failures {
                        tracing::error!("delete request failed: {err}");
                    }
                }
                Err(err) => tracing::error!("delete request failed: {err}"),
            }
            self.record(ActionKind::Delete, &event.path);
        } else {
            match self.backups.backup(&event.path) {
                Ok(dest) => {
                    tracing::debug!("backed up to {}", dest.display());
                    self.record(ActionKind::Backup, &event.path);
                }
                Err(err) => tracing::error!("backup failed: {err}"),
            }
        }

        self.state.touch(&event.path, Utc::now());
    }

    fn record(&self, action: ActionKind, path: &Path) {
        if let Err(err) = self.logger.record(action, path) {
            tracing::error!("failed to write audit record {action} {}: {err}", path.display());
        }
    }
}
