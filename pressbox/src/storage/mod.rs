//! Persistent local state: settings and the build artifact

pub mod artifact;
pub mod settings;
