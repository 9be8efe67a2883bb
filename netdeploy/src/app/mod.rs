//! Application module

pub mod options;
pub mod run;
