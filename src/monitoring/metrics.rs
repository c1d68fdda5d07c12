// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
    #[error("encode")]
    Encode,
}

/// Metrics container.
#[derive(Clone)]
pub struct Metrics {
    /// Registry.
    pub registry: Registry,

    /// Alerts created.
    pub alerts_created_total: IntCounter,
    /// First-time device registrations.
    pub devices_registered_total: IntCounter,
    /// Successful alert/device links.
    pub associations_total: IntCounter,
    /// Links rejected because the alert or device was missing.
    pub association_rejected_total: IntCounter,
    /// Last allocated alert id.
    pub last_alert_id: IntGauge,
    /// Ledger height seen on the last create.
    pub ledger_height: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, MetricsError> {
    let c = IntCounter::new(name, help).map_err(|_| MetricsError::Prom)?;
    registry
        .register(Box::new(c.clone()))
        .map_err(|_| MetricsError::Prom)?;
    Ok(c)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, MetricsError> {
    let g = IntGauge::new(name, help).map_err(|_| MetricsError::Prom)?;
    registry
        .register(Box::new(g.clone()))
        .map_err(|_| MetricsError::Prom)?;
    Ok(g)
}

impl Metrics {
    /// Create and register metrics on a private registry.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let alerts_created_total =
            counter(&registry, "amunchain_alerts_created_total", "Alerts created")?;
        let devices_registered_total = counter(
            &registry,
            "amunchain_alerts_devices_registered_total",
            "Devices registered",
        )?;
        let associations_total = counter(
            &registry,
            "amunchain_alerts_associations_total",
            "Alert/device links recorded",
        )?;
        let association_rejected_total = counter(
            &registry,
            "amunchain_alerts_association_rejected_total",
            "Alert/device links rejected (not found)",
        )?;
        let last_alert_id = gauge(
            &registry,
            "amunchain_alerts_last_alert_id",
            "Last allocated alert id",
        )?;
        let ledger_height = gauge(
            &registry,
            "amunchain_alerts_ledger_height",
            "Ledger height of the last alert",
        )?;

        Ok(Self {
            registry,
            alerts_created_total,
            devices_registered_total,
            associations_total,
            association_rejected_total,
            last_alert_id,
            ledger_height,
        })
    }

    /// Prometheus text exposition of all registered metrics.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|_| MetricsError::Encode)?;
        String::from_utf8(buf).map_err(|_| MetricsError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_contains_registered_series() {
        let m = Metrics::new().unwrap();
        m.alerts_created_total.inc();
        m.last_alert_id.set(7);
        let text = m.render().unwrap();
        assert!(text.contains("amunchain_alerts_created_total 1"));
        assert!(text.contains("amunchain_alerts_last_alert_id 7"));
    }

    #[test]
    fn instances_do_not_share_registries() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.associations_total.inc();
        assert_eq!(b.associations_total.get(), 0);
    }
}
