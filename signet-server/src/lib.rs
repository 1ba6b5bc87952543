//! # Signet Server
//!
//! Account directory service.
//!
//! ## Overview
//!
//! Signet Server fronts a PostgreSQL-backed user directory:
//!
//! - **Account CRUD**: create, fetch, update and delete user records
//! - **Availability checks**: username lookups with a screened-names list
//! - **Health gating**: storage-backed routes answer 503 while the store is down
//! - **Supervised startup**: store bring-up outcomes reported over a status pipe
//!
//! ## Architecture
//!
//! Built on Axum, with PostgreSQL (via sqlx) behind the storage port from
//! `signet-core`. The server survives an unreachable store at startup: it
//! serves probe routes and answers everything else with 503 until the
//! store comes back.

/// Runtime configuration from environment and CLI overrides
pub mod config;
/// HTTP error envelope and status mapping
pub mod errors;
/// Health gating for storage-backed routes
pub mod gate;
/// Request handlers
pub mod handlers;
/// Router assembly
pub mod routes;
/// Shared application state
pub mod state;
/// Supervisor status-pipe signaling
pub mod supervisor;
