//! Health check types
//!
//! Shared by the engine's health probe and whatever web layer exposes it.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Health status for a component or for the engine as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is fully operational
    Healthy,
    /// Component is operational but degraded
    Degraded,
    /// Component is not operational
    Unhealthy,
}

/// Result of checking a single component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub message: String,
    /// Response time in milliseconds (if applicable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl HealthCheck {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: message.into(),
            response_time_ms: None,
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded,
            message: message.into(),
            response_time_ms: None,
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: message.into(),
            response_time_ms: None,
        }
    }

    /// Set the response time.
    pub fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }
}

/// Aggregated health of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub timestamp: Timestamp,
    pub overall_status: HealthStatus,
    pub checks: BTreeMap<String, HealthCheck>,
}

impl HealthReport {
    /// Build a report; overall status is the worst individual status.
    pub fn from_checks(timestamp: Timestamp, checks: BTreeMap<String, HealthCheck>) -> Self {
        let overall_status = if checks
            .values()
            .any(|c| c.status == HealthStatus::Unhealthy)
        {
            HealthStatus::Unhealthy
        } else if checks.values().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            timestamp,
            overall_status,
            checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_overall_status_is_worst_check() {
        let mut checks = BTreeMap::new();
        checks.insert("a".to_string(), HealthCheck::healthy("ok"));
        checks.insert("b".to_string(), HealthCheck::degraded("slow"));
        let report = HealthReport::from_checks(Utc::now(), checks.clone());
        assert_eq!(report.overall_status, HealthStatus::Degraded);

        checks.insert("c".to_string(), HealthCheck::unhealthy("down"));
        let report = HealthReport::from_checks(Utc::now(), checks);
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_empty_report_is_healthy() {
        let report = HealthReport::from_checks(Utc::now(), BTreeMap::new());
        assert_eq!(report.overall_status, HealthStatus::Healthy);
    }
}
