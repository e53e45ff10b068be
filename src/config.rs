//! Configuration management for the monitor

use crate::metrics::ResourceKind;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tenant to authenticate against
    pub tenant_id: String,

    /// Subscription the resource resides in
    pub subscription_id: String,

    /// Service principal client id
    pub client_id: String,

    /// Service principal client secret
    pub client_secret: String,

    /// Resource group of the monitored resource
    pub resource_group: String,

    /// Name of the monitored resource
    pub resource_name: String,

    /// Kind of the monitored resource (site or hosting plan)
    pub resource_kind: ResourceKind,

    /// Number of one-minute samples to request per poll
    pub window_minutes: u32,

    /// Delay between polling ticks
    pub poll_interval: Duration,

    /// HTTP timeout for identity and management requests
    pub http_timeout: Duration,

    /// Base URL of the identity authority
    pub authority_url: String,

    /// Base URL of the management API
    pub management_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tenant_id: "<tenant-guid>".to_string(),
            subscription_id: "<subscription-guid>".to_string(),
            client_id: "<service-principal-client-id>".to_string(),
            client_secret: "<service-principal-client-secret>".to_string(),
            resource_group: "Group".to_string(),
            resource_name: "sitename".to_string(),
            resource_kind: ResourceKind::Sites,
            window_minutes: 5,
            poll_interval: Duration::from_secs(60),
            http_timeout: Duration::from_secs(10),
            authority_url: "https://login.microsoftonline.com".to_string(),
            management_url: "https://management.azure.com".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from a key lookup, falling back to defaults
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(tenant_id) = lookup("TENANT_ID") {
            config.tenant_id = tenant_id;
        }

        if let Some(subscription_id) = lookup("SUBSCRIPTION_ID") {
            config.subscription_id = subscription_id;
        }

        if let Some(client_id) = lookup("CLIENT_ID") {
            config.client_id = client_id;
        }

        if let Some(client_secret) = lookup("CLIENT_SECRET") {
            config.client_secret = client_secret;
        }

        if let Some(resource_group) = lookup("RESOURCE_GROUP") {
            config.resource_group = resource_group;
        }

        if let Some(resource_name) = lookup("RESOURCE_NAME") {
            config.resource_name = resource_name;
        }

        if let Some(resource_kind) = lookup("RESOURCE_KIND") {
            config.resource_kind = ResourceKind::from(resource_kind.as_str());
        }

        if let Some(window) = lookup("WINDOW_MINUTES") {
            if let Ok(minutes) = window.parse() {
                config.window_minutes = minutes;
            }
        }

        if let Some(poll_interval) = lookup("POLL_INTERVAL_SECONDS") {
            if let Ok(seconds) = poll_interval.parse::<u64>() {
                config.poll_interval = Duration::from_secs(seconds);
            }
        }

        if let Some(timeout) = lookup("HTTP_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.http_timeout = Duration::from_secs(seconds);
            }
        }

        if let Some(authority_url) = lookup("AUTHORITY_URL") {
            config.authority_url = authority_url;
        }

        if let Some(management_url) = lookup("MANAGEMENT_URL") {
            config.management_url = management_url;
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.tenant_id.is_empty() {
            return Err("tenant_id cannot be empty".to_string());
        }

        if self.subscription_id.is_empty() {
            return Err("subscription_id cannot be empty".to_string());
        }

        if self.client_id.is_empty() {
            return Err("client_id cannot be empty".to_string());
        }

        if self.client_secret.is_empty() {
            return Err("client_secret cannot be empty".to_string());
        }

        if self.resource_group.is_empty() {
            return Err("resource_group cannot be empty".to_string());
        }

        if self.resource_name.is_empty() {
            return Err("resource_name cannot be empty".to_string());
        }

        if self.window_minutes == 0 {
            return Err("window_minutes must be greater than 0".to_string());
        }

        if self.authority_url.is_empty() {
            return Err("authority_url cannot be empty".to_string());
        }

        if self.management_url.is_empty() {
            return Err("management_url cannot be empty".to_string());
        }

        Ok(())
    }
}
