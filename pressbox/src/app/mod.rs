//! Application options

pub mod options;
