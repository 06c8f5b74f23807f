//! HTTP API gateway for the habit tracker.
//!
//! Applies CORS, JSON body and cookie parsing to every request, dispatches
//! `/api/habits`, `/api/auth` and `/api/stats` to their route groups, answers
//! `/api/health` directly and turns every failure into a JSON error envelope.

pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{AppError, AppResult};
