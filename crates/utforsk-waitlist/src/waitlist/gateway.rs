use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::supabase::{GatewayError, SupabaseGateway};
use crate::config::WaitlistConfig;

/// Result of one insert attempt against the waitlist table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Success,
    /// The address violates the table's uniqueness constraint.
    DuplicateConflict,
    /// Any other failure. The message may be empty when the backend gave none.
    OtherFailure(String),
}

/// Capability boundary between the submission controller and persistence.
#[async_trait]
pub trait WaitlistGateway: Debug + Send + Sync {
    async fn insert(&self, email: &str) -> InsertOutcome;

    /// Short label for logs and health output.
    fn kind(&self) -> GatewayKind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
    Remote,
    Simulated,
}

impl GatewayKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Simulated => "simulated",
        }
    }
}

/// Stand-in used when no backend is configured. Waits like a real request
/// would, then reports success without storing anything.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

#[async_trait]
impl WaitlistGateway for SimulatedGateway {
    async fn insert(&self, email: &str) -> InsertOutcome {
        tokio::time::sleep(self.delay).await;
        info!(email, "demo mode: email would be saved to the waitlist");
        InsertOutcome::Success
    }

    fn kind(&self) -> GatewayKind {
        GatewayKind::Simulated
    }
}

/// Picks the gateway once at startup: remote when the backend is configured,
/// simulated otherwise.
pub fn gateway_from_config(
    config: &WaitlistConfig,
) -> Result<Arc<dyn WaitlistGateway>, GatewayError> {
    match &config.backend {
        Some(backend) => {
            let gateway = SupabaseGateway::from_config(backend)?;
            info!(url = %backend.url, table = %backend.table, "waitlist backend configured");
            Ok(Arc::new(gateway))
        }
        None => {
            info!(
                delay_ms = config.demo_delay.as_millis() as u64,
                "waitlist backend not configured, running in demo mode"
            );
            Ok(Arc::new(SimulatedGateway::new(config.demo_delay)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    fn waitlist_config(backend: Option<BackendConfig>) -> WaitlistConfig {
        WaitlistConfig {
            backend,
            demo_delay: Duration::from_millis(5),
            session_ttl: Duration::from_secs(60),
            max_sessions: 16,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_gateway_waits_then_succeeds() {
        let gateway = SimulatedGateway::default();
        let started = tokio::time::Instant::now();

        let outcome = gateway.insert("a@b.com").await;

        assert_eq!(outcome, InsertOutcome::Success);
        assert!(started.elapsed() >= SimulatedGateway::DEFAULT_DELAY);
    }

    #[test]
    fn missing_backend_selects_simulated_gateway() {
        let gateway = gateway_from_config(&waitlist_config(None)).expect("gateway builds");
        assert_eq!(gateway.kind(), GatewayKind::Simulated);
    }

    #[test]
    fn configured_backend_selects_remote_gateway() {
        let backend = BackendConfig {
            url: "https://project.supabase.co".to_string(),
            anon_key: "anon-key".to_string(),
            table: "waitlist".to_string(),
            request_timeout: Duration::from_secs(10),
        };
        let gateway =
            gateway_from_config(&waitlist_config(Some(backend))).expect("gateway builds");
        assert_eq!(gateway.kind(), GatewayKind::Remote);
        assert_eq!(gateway.kind().label(), "remote");
    }
}
