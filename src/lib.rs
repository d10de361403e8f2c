//! API Gateway: a reverse-proxy data plane with a hot-reloadable control
//! plane for API definitions, sessions, and OAuth clients.

pub mod config;
pub mod controlplane;
pub mod errors;
pub mod models;
pub mod notifications;
pub mod oauth;
pub mod proxy;
pub mod registry;
pub mod reload;
pub mod session;
pub mod utils;
