//! Backend reachability probe.
//!
//! The probe bypasses the provider and cache layers on purpose: it asks
//! the upstream the cheapest possible question over a dedicated client
//! with a short timeout, so a wedged backend cannot stall the probe for
//! the full request timeout.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::{debug, warn};

use crate::config::{ApiConfig, ProviderKind};
use crate::magento::client::GraphqlClient;
use crate::magento::queries;
use crate::magento::wire::StoreConfigData;

/// Probe requests get a tighter deadline than regular traffic.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// A healthy backend that answers slower than this is reported as
/// degraded.
const DEGRADED_THRESHOLD: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Reachable and fast.
    Ok,
    /// Reachable but slow.
    Degraded,
    /// Unreachable, erroring, or misconfigured.
    Down,
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub backend: &'static str,
    pub status: HealthStatus,
    pub latency: Duration,
    /// Failure detail when the backend is not `Ok`.
    pub detail: Option<String>,
}

/// Probes the configured backend once.
pub async fn probe(config: &ApiConfig) -> HealthReport {
    match config.provider {
        // The mock runs in-process; it is up whenever we are.
        ProviderKind::Mock => HealthReport {
            backend: ProviderKind::Mock.as_str(),
            status: HealthStatus::Ok,
            latency: Duration::ZERO,
            detail: None,
        },
        ProviderKind::Magento => probe_magento(config).await,
    }
}

async fn probe_magento(config: &ApiConfig) -> HealthReport {
    let backend = ProviderKind::Magento.as_str();
    let Some(magento) = &config.magento else {
        return HealthReport {
            backend,
            status: HealthStatus::Down,
            latency: Duration::ZERO,
            detail: Some("magento backend selected but not configured".to_owned()),
        };
    };

    let mut probe_config = magento.clone();
    probe_config.timeout = PROBE_TIMEOUT;
    let client = match GraphqlClient::new(&probe_config) {
        Ok(client) => client,
        Err(error) => {
            return HealthReport {
                backend,
                status: HealthStatus::Down,
                latency: Duration::ZERO,
                detail: Some(error.to_string()),
            };
        }
    };

    let started = Instant::now();
    let outcome = client
        .execute::<StoreConfigData>(queries::HEALTH_QUERY, json!({}), None)
        .await;
    let latency = started.elapsed();

    match outcome {
        Ok(data) => {
            let store_code = data.store_config.and_then(|c| c.store_code);
            debug!(?latency, store_code = store_code.as_deref(), "magento health probe succeeded");
            HealthReport {
                backend,
                status: if latency > DEGRADED_THRESHOLD {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Ok
                },
                latency,
                detail: None,
            }
        }
        Err(error) => {
            warn!(%error, ?latency, "magento health probe failed");
            HealthReport {
                backend,
                status: HealthStatus::Down,
                latency,
                detail: Some(error.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_backend_is_always_up() {
        let report = probe(&ApiConfig::mock()).await;
        assert_eq!(report.backend, "mock");
        assert_eq!(report.status, HealthStatus::Ok);
        assert!(report.detail.is_none());
    }

    #[tokio::test]
    async fn magento_without_configuration_reports_down() {
        let config = ApiConfig {
            provider: ProviderKind::Magento,
            magento: None,
            data_dir: None,
        };
        let report = probe(&config).await;
        assert_eq!(report.status, HealthStatus::Down);
        assert!(report.detail.is_some());
    }
}
