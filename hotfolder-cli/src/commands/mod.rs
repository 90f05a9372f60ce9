pub mod logs;
pub mod monitor;
