//! HTTP gateway: the front door for starting and stopping course checks.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
