//! Local HTTP server exposing the progress endpoint

pub mod error;
pub mod handlers;
pub mod serve;
pub mod state;

pub use serve::{router, serve};
pub use state::ServerState;
