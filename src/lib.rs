//! Web App Metrics Monitor Library
//!
//! This library provides components for authenticating against an identity
//! authority and periodically fetching resource metrics and health status
//! for a web-hosting resource from the management REST API.

pub mod auth;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod poller;

pub use auth::TokenProvider;
pub use config::Config;
pub use errors::{MonitorError, Result};
pub use metrics::{Metric, MetricListResponse, MetricValue, ResourceKind};
pub use poller::MetricsPoller;
