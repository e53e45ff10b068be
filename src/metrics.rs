//! Metric query construction and response model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// API version for the metrics collection
pub const METRICS_API_VERSION: &str = "2014-04-01";

/// API version for the resource-health endpoint
pub const HEALTH_API_VERSION: &str = "2015-01-01";

/// Sampling granularity requested from the metrics backend
pub const TIME_GRAIN: &str = "PT1M";

/// Minute-precision UTC timestamp format used in filter expressions
const WINDOW_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

/// Kind of web-hosting resource to query metrics for
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Sites,
    Serverfarms,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Sites => write!(f, "sites"),
            ResourceKind::Serverfarms => write!(f, "serverfarms"),
        }
    }
}

impl From<&str> for ResourceKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "serverfarms" | "serverfarm" | "hostingplan" => ResourceKind::Serverfarms,
            _ => ResourceKind::Sites, // Default fallback
        }
    }
}

/// Time window covering the trailing `window_minutes` minutes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MetricWindow {
    /// Build a window ending at the current wall-clock time
    pub fn ending_now(window_minutes: u32) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::minutes(window_minutes as i64),
            end,
        }
    }

    pub fn format_start(&self) -> String {
        self.start.format(WINDOW_FORMAT).to_string()
    }

    pub fn format_end(&self) -> String {
        self.end.format(WINDOW_FORMAT).to_string()
    }
}

/// Build the management resource path for a web-hosting resource
pub fn resource_path(
    subscription_id: &str,
    resource_group: &str,
    kind: ResourceKind,
    resource_name: &str,
) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/{}/{}/",
        subscription_id, resource_group, kind, resource_name
    )
}

/// Build the OData filter selecting the window at one-minute grain
pub fn metrics_filter(window: &MetricWindow) -> String {
    format!(
        "startTime eq {} and endTime eq {} and timeGrain eq duration'{}'",
        window.format_start(),
        window.format_end(),
        TIME_GRAIN
    )
}

/// Build the availability-status URL for a web app.
///
/// The resource-health route is only defined for sites, so the kind is
/// pinned here rather than taken as a parameter.
pub fn health_url(
    management_url: &str,
    subscription_id: &str,
    resource_group: &str,
    resource_name: &str,
) -> String {
    format!(
        "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/sites/{}/providers/Microsoft.ResourceHealth/availabilityStatuses/current?api-version={}",
        management_url.trim_end_matches('/'),
        subscription_id,
        resource_group,
        resource_name,
        HEALTH_API_VERSION
    )
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricListResponse {
    #[serde(default)]
    pub value: Vec<Metric>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub name: MetricName,
    #[serde(default)]
    pub metric_values: Vec<MetricValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricName {
    pub value: String,
    #[serde(default)]
    pub localized_value: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MetricValue {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub average: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_spans_requested_minutes() {
        let window = MetricWindow::ending_now(5);
        assert!(window.start < window.end);
        assert_eq!(window.end - window.start, Duration::minutes(5));
    }

    #[test]
    fn test_window_format_drops_seconds() {
        let window = MetricWindow {
            start: Utc.with_ymd_and_hms(2024, 5, 1, 12, 25, 45).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap(),
        };
        assert_eq!(window.format_start(), "2024-05-01T12:25Z");
        assert_eq!(window.format_end(), "2024-05-01T12:30Z");
    }

    #[test]
    fn test_resource_path_for_site() {
        let path = resource_path("sub1", "rg1", ResourceKind::Sites, "site1");
        assert_eq!(
            path,
            "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Web/sites/site1/"
        );
    }

    #[test]
    fn test_resource_path_for_serverfarm() {
        let path = resource_path("sub1", "rg1", ResourceKind::Serverfarms, "plan1");
        assert_eq!(
            path,
            "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Web/serverfarms/plan1/"
        );
    }

    #[test]
    fn test_metrics_filter_is_deterministic() {
        let window = MetricWindow {
            start: Utc.with_ymd_and_hms(2024, 5, 1, 12, 25, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        };
        assert_eq!(
            metrics_filter(&window),
            "startTime eq 2024-05-01T12:25Z and endTime eq 2024-05-01T12:30Z and timeGrain eq duration'PT1M'"
        );
    }

    #[test]
    fn test_health_url_pins_sites_and_api_version() {
        let url = health_url("https://management.azure.com", "sub1", "rg1", "site1");
        assert_eq!(
            url,
            "https://management.azure.com/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Web/sites/site1/providers/Microsoft.ResourceHealth/availabilityStatuses/current?api-version=2015-01-01"
        );
    }

    #[test]
    fn test_resource_kind_parsing() {
        assert_eq!(ResourceKind::from("sites"), ResourceKind::Sites);
        assert_eq!(ResourceKind::from("SERVERFARMS"), ResourceKind::Serverfarms);
        assert_eq!(ResourceKind::from("unknown"), ResourceKind::Sites);
    }

    #[test]
    fn test_metric_list_deserialization() {
        let payload = r#"{
            "value": [
                {
                    "name": { "value": "CpuTime", "localizedValue": "CPU Time" },
                    "metricValues": [
                        { "timestamp": "2024-05-01T12:26:00Z", "maximum": 2.5, "average": 1.25 },
                        { "timestamp": "2024-05-01T12:27:00Z", "maximum": 3.0 }
                    ]
                },
                {
                    "name": { "value": "Requests" }
                }
            ]
        }"#;

        let list: MetricListResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(list.value.len(), 2);
        assert_eq!(list.value[0].name.value, "CpuTime");
        assert_eq!(list.value[0].metric_values.len(), 2);
        assert_eq!(list.value[0].metric_values[0].maximum, Some(2.5));
        assert_eq!(list.value[0].metric_values[1].average, None);
        assert!(list.value[1].metric_values.is_empty());
    }
}
