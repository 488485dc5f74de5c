/// blogmesh - blog, comment, user and notification services with an API gateway
///
/// Each service owns one in-memory store. Dependent writes validate their
/// parent with a peer service and announce themselves to the notification
/// service on a best-effort basis.
pub mod api;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod server;
pub mod stats;
pub mod store;
pub mod validation;
