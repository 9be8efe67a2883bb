//! NetDeploy Library
//!
//! Core modules for batch configuration deployment to network devices.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod export;
pub mod inventory;
pub mod logs;
pub mod models;
pub mod payload;
pub mod probe;
pub mod session;
pub mod settings;
pub mod utils;
pub mod vendor;
