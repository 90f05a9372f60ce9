//! Hot-folder monitor runtime: notify subscription + sequential dispatch.

mod error;
mod runtime;
pub mod translate;

pub use error::DaemonError;
pub use runtime::{monitor, run, start_blocking, LoopStats};
