//! Watchdog loop.
//!
//! Each cycle is independent: probe, maybe redeploy, sleep. No backoff, no
//! history, no retry inside a cycle. Faults are logged and the loop goes on.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::config::MonitorSettings;
use crate::error::Error;

/// Upper bound for the redeploy POST.
const REDEPLOY_TIMEOUT: Duration = Duration::from_secs(30);

/// Probe verdict for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Up,
    /// Transport fault or non-200 status, with a short reason.
    Down(String),
}

impl Health {
    pub fn is_up(&self) -> bool {
        matches!(self, Health::Up)
    }
}

/// Result of one redeploy webhook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeployOutcome {
    Triggered,
    Rejected { status: u16, body: String },
    Failed(String),
}

/// What happened in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub health: Health,
    pub redeploy: Option<RedeployOutcome>,
}

/// Liveness monitor.
pub struct LivenessMonitor {
    client: Client,
    settings: MonitorSettings,
}

impl LivenessMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self { client: Client::new(), settings }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// GET the check URL with the configured timeout.
    pub async fn probe(&self) -> Health {
        let response = self
            .client
            .get(&self.settings.check_url)
            .timeout(self.settings.timeout)
            .send()
            .await;

        match response {
            Ok(r) if r.status() == StatusCode::OK => Health::Up,
            Ok(r) => Health::Down(format!("status {}", r.status())),
            Err(e) if e.is_timeout() => Health::Down(format!("timed out after {:?}", self.settings.timeout)),
            Err(e) => Health::Down(format!("request failed: {}", e)),
        }
    }

    /// POST (no body) to the redeploy hook. Success means HTTP 200.
    pub async fn trigger_redeploy(&self) -> RedeployOutcome {
        let response = self
            .client
            .post(&self.settings.deploy_hook)
            .timeout(REDEPLOY_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(r) if r.status() == StatusCode::OK => RedeployOutcome::Triggered,
            Ok(r) => {
                let status = r.status().as_u16();
                let body = r.text().await.unwrap_or_default();
                RedeployOutcome::Rejected { status, body }
            }
            Err(e) => RedeployOutcome::Failed(e.to_string()),
        }
    }

    /// One probe, and one redeploy attempt if the service is down.
    pub async fn run_cycle(&self) -> CycleReport {
        let health = self.probe().await;

        let redeploy = match &health {
            Health::Up => {
                tracing::info!("🟢 Service is up: {}", self.settings.check_url);
                None
            }
            Health::Down(reason) => {
                tracing::warn!("🔴 Service is down ({}). Triggering redeploy...", reason);
                let outcome = self.trigger_redeploy().await;
                match &outcome {
                    RedeployOutcome::Triggered => tracing::info!("✅ Redeploy triggered"),
                    RedeployOutcome::Rejected { status, body } => {
                        tracing::error!("⚠️ Redeploy hook answered {}: {}", status, body)
                    }
                    RedeployOutcome::Failed(e) => tracing::error!("❌ Redeploy hook failed: {}", e),
                }
                Some(outcome)
            }
        };

        CycleReport { health, redeploy }
    }

    /// Cycle forever, sleeping `interval` between cycles, until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            "🚀 Liveness monitor started: {} every {:?}",
            self.settings.check_url,
            self.settings.interval
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.run_cycle() => {}
            }
            tokio::select! {
                _ = &mut shutdown => break,
                _ = sleep(self.settings.interval) => {}
            }
        }

        tracing::info!("Liveness monitor stopped");
    }
}

/// Run the liveness monitor until Ctrl+C.
pub async fn run_monitor_daemon(settings: MonitorSettings) -> Result<(), Error> {
    let monitor = LivenessMonitor::new(settings);
    monitor
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Ctrl+C handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(check_url: String, deploy_hook: String) -> MonitorSettings {
        MonitorSettings {
            check_url,
            deploy_hook,
            interval: Duration::from_millis(20),
            timeout: Duration::from_millis(300),
        }
    }

    #[tokio::test]
    async fn test_server_error_triggers_one_redeploy() {
        let mut server = mockito::Server::new_async().await;
        let probe = server.mock("GET", "/").with_status(500).create_async().await;
        let hook = server
            .mock("POST", "/deploy")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let monitor = LivenessMonitor::new(settings(server.url(), format!("{}/deploy", server.url())));
        let report = monitor.run_cycle().await;

        assert_eq!(report.health, Health::Down("status 500 Internal Server Error".into()));
        assert_eq!(report.redeploy, Some(RedeployOutcome::Triggered));
        probe.assert_async().await;
        hook.assert_async().await;
    }

    #[tokio::test]
    async fn test_timeout_is_down_and_redeploys() {
        // Accepts connections but never answers.
        let silent = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let silent_url = format!("http://{}/", silent.local_addr().unwrap());

        let mut server = mockito::Server::new_async().await;
        let hook = server
            .mock("POST", "/deploy")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let monitor = LivenessMonitor::new(settings(silent_url, format!("{}/deploy", server.url())));
        let report = monitor.run_cycle().await;

        assert!(!report.health.is_up());
        assert!(matches!(report.health, Health::Down(ref r) if r.starts_with("timed out")));
        hook.assert_async().await;
        drop(silent);
    }

    #[tokio::test]
    async fn test_healthy_service_skips_redeploy() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server.mock("GET", "/").with_status(200).create_async().await;
        let hook = server.mock("POST", "/deploy").expect(0).create_async().await;

        let monitor = LivenessMonitor::new(settings(server.url(), format!("{}/deploy", server.url())));
        let report = monitor.run_cycle().await;

        assert_eq!(report, CycleReport { health: Health::Up, redeploy: None });
        hook.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_200_success_counts_as_down() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server.mock("GET", "/").with_status(204).create_async().await;
        let _hook = server.mock("POST", "/deploy").with_status(200).create_async().await;

        let monitor = LivenessMonitor::new(settings(server.url(), format!("{}/deploy", server.url())));
        assert!(!monitor.probe().await.is_up());
    }

    #[tokio::test]
    async fn test_redeploy_failures_are_reported_not_raised() {
        let mut server = mockito::Server::new_async().await;
        let _probe = server.mock("GET", "/").with_status(503).create_async().await;
        let _hook = server
            .mock("POST", "/deploy")
            .with_status(401)
            .with_body("bad key")
            .create_async()
            .await;

        let monitor = LivenessMonitor::new(settings(server.url(), format!("{}/deploy", server.url())));
        let report = monitor.run_cycle().await;
        assert_eq!(
            report.redeploy,
            Some(RedeployOutcome::Rejected { status: 401, body: "bad key".into() })
        );

        let unreachable = LivenessMonitor::new(settings(server.url(), "http://127.0.0.1:9/deploy".into()));
        assert!(matches!(unreachable.trigger_redeploy().await, RedeployOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_loop_repeats_until_shutdown() {
        let mut server = mockito::Server::new_async().await;
        let probe = server
            .mock("GET", "/")
            .with_status(200)
            .expect_at_least(2)
            .create_async()
            .await;

        let monitor = LivenessMonitor::new(settings(server.url(), format!("{}/deploy", server.url())));
        monitor.run_until(sleep(Duration::from_millis(250))).await;
        probe.assert_async().await;
    }
}
