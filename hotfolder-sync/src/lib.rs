//! # hotfolder-sync
//!
//! The event-driven synchronization state machine.
//!
//! [`EventProcessor`] turns one [`FsEvent`](hotfolder_core::FsEvent) into a
//! backup, a delete, or a rename cleanup, records the action in the audit log
//! and keeps the persisted [`TrackingState`] current. The pieces it drives
//! ([`BackupStore`], [`TrackingStore`], [`ActionLogger`]) return `Result`s;
//! only the processor decides to log and carry on.

pub mod action_log;
pub mod audit;
pub mod backup;
pub mod error;
pub mod processor;
pub mod tracking;

pub use action_log::ActionLogger;
pub use backup::{BackupStore, DeleteReport};
pub use error::SyncError;
pub use processor::{Dispatch, EventProcessor};
pub use tracking::{TrackingState, TrackingStore};
