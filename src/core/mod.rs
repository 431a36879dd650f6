// src/core/mod.rs
//! Side-effecting services the pipeline stages are kept free of

pub mod config_manager;
pub mod digest;
pub mod fs_ops;
pub mod ledger;

pub use config_manager::ConfigManager;
pub use fs_ops::{ArtifactStore, FsOps};
pub use ledger::TrackerLedger;
