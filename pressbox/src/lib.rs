//! Pressbox Library
//!
//! Provisions a WordPress sandbox and streams its progress as
//! newline-delimited JSON records.

pub mod app;
pub mod commands;
pub mod config;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod provision;
pub mod sandbox;
pub mod server;
pub mod storage;
pub mod utils;
