//! Polling loop fetching resource metrics and health status

use crate::auth::TokenProvider;
use crate::config::Config;
use crate::errors::{MonitorError, Result};
use crate::metrics::{self, MetricListResponse, MetricWindow, ResourceKind};

use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Authenticated poller for a single web-hosting resource.
///
/// Owns the HTTP client and the bearer token for the process lifetime;
/// both are released when the poller is dropped.
#[derive(Debug)]
pub struct MetricsPoller {
    config: Config,
    client: Client,
    token: String,
    poller_id: String,
}

impl MetricsPoller {
    /// Create a new poller, authenticating once up front.
    ///
    /// Fails before any management call is attempted if the credential
    /// exchange is rejected.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;

        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(format!("webapp_monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MonitorError::Http)?;

        let provider = TokenProvider::new(config.authority_url.clone(), config.tenant_id.clone());
        let token = provider
            .fetch_token(&client, &config.client_id, &config.client_secret)
            .await?;

        Ok(Self {
            config,
            client,
            token,
            poller_id: Uuid::new_v4().to_string(),
        })
    }

    /// Retrieve the per-minute metrics of a resource over the trailing window.
    pub async fn get_metrics(
        &self,
        resource_group: &str,
        resource_name: &str,
        kind: ResourceKind,
        window_minutes: u32,
    ) -> Result<MetricListResponse> {
        let window = MetricWindow::ending_now(window_minutes);
        let path = metrics::resource_path(
            &self.config.subscription_id,
            resource_group,
            kind,
            resource_name,
        );
        let filter = metrics::metrics_filter(&window);
        let url = format!(
            "{}{}metrics",
            self.config.management_url.trim_end_matches('/'),
            path
        );

        debug!("Fetching metrics from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api-version", metrics::METRICS_API_VERSION),
                ("$filter", filter.as_str()),
            ])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response.text().await?;
        let list: MetricListResponse = serde_json::from_str(&body)?;
        Ok(list)
    }

    /// Retrieve the availability status of a web app as a raw JSON document.
    pub async fn get_health(&self, resource_group: &str, resource_name: &str) -> Result<Value> {
        let url = metrics::health_url(
            &self.config.management_url,
            &self.config.subscription_id,
            resource_group,
            resource_name,
        );

        debug!("Fetching health status from {}", url);

        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;

        let response = check_status(response).await?;
        let body = response.text().await?;
        let health: Value = serde_json::from_str(&body)?;
        Ok(health)
    }

    /// Run the polling loop until the shutdown flag is raised.
    ///
    /// Any fetch failure aborts the loop with the error; there is no
    /// partial-failure isolation between the metrics and health calls
    /// within a tick.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "Starting poller {} for {}/{} ({}) every {:?}",
            self.poller_id,
            self.config.resource_group,
            self.config.resource_name,
            self.config.resource_kind,
            self.config.poll_interval
        );

        let mut tick = interval(self.config.poll_interval);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    self.poll_once().await?;
                }
                _ = shutdown.changed() => {
                    break;
                }
            }
        }

        info!("Poller {} stopped", self.poller_id);
        Ok(())
    }

    /// One polling tick: metrics, then health, both rendered to stdout.
    async fn poll_once(&self) -> Result<()> {
        let list = self
            .get_metrics(
                &self.config.resource_group,
                &self.config.resource_name,
                self.config.resource_kind,
                self.config.window_minutes,
            )
            .await?;
        print!("{}", render_metrics(&list, Utc::now()));

        let health = self
            .get_health(&self.config.resource_group, &self.config.resource_name)
            .await?;
        println!("{}", render_health(&health));

        Ok(())
    }
}

/// Map a non-success management response to an API error carrying the body
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(MonitorError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Render a metric list for the console.
///
/// Each series prints its name followed by a `maximum/average` pair per
/// sample. A series without samples prints a no-data notice and stops
/// rendering the remaining series for this tick. The last line reports
/// the request time and the timestamp of the last sample of the last
/// non-empty series.
pub fn render_metrics(list: &MetricListResponse, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let mut last_sample_time = String::new();

    for metric in &list.value {
        out.push_str(&format!("{}:   \t", metric.name.value));
        for sample in &metric.metric_values {
            out.push_str(&format!(
                "{}/{}\t",
                format_sample(sample.maximum),
                format_sample(sample.average)
            ));
        }
        out.push('\n');

        if metric.metric_values.is_empty() {
            out.push_str("-= No data in resultset =-\n");
            return out;
        }

        if let Some(last) = metric.metric_values.last() {
            last_sample_time = last.timestamp.format("%H:%M:%S").to_string();
        }
    }

    out.push_str(&format!(
        "Request: {} -> Last metric time: {} UTC\n",
        now.format("%H:%M:%S"),
        last_sample_time
    ));
    out
}

/// Render the health payload, extracting only the `properties` field
pub fn render_health(health: &Value) -> String {
    let properties = health.get("properties").unwrap_or(health);
    format!("HealthResult: {}", properties)
}

fn format_sample(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
