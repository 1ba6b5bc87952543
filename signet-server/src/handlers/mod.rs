//! Request handlers, grouped by surface.

/// Liveness and store-health probes
pub mod status;
/// Account CRUD and availability checks
pub mod users;
