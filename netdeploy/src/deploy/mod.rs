//! Deployment module

pub mod engine;
pub mod events;
