//! Health checks over the service's collaborators.

use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

type CheckFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), String>> + Send + Sync>;

/// Run an async check with timeout; returns status string "healthy", "timeout", or "unhealthy: {error}".
async fn run_check<F>(timeout: Duration, f: F) -> String
where
    F: Future<Output = Result<(), String>>,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("unhealthy: {}", e),
        Err(_) => "timeout".to_string(),
    }
}

/// Aggregate result of every registered check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub checks: BTreeMap<String, String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Named health checks run together with a per-check timeout.
#[derive(Clone)]
pub struct HealthRegistry {
    timeout: Duration,
    checks: Vec<(String, CheckFn)>,
}

impl HealthRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            checks: Vec::new(),
        }
    }

    /// Register a check. `check` is called once per [`run`](Self::run).
    pub fn register<F, Fut, E>(&mut self, name: &str, check: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display,
    {
        let check: CheckFn = Arc::new(move || {
            let fut = check();
            Box::pin(async move { fut.await.map_err(|e| e.to_string()) })
        });
        self.checks.push((name.to_string(), check));
    }

    /// Run every check concurrently.
    pub async fn run(&self) -> HealthReport {
        let results = futures::future::join_all(self.checks.iter().map(|(name, check)| {
            let timeout = self.timeout;
            let fut = check();
            async move { (name.clone(), run_check(timeout, fut).await) }
        }))
        .await;

        let healthy = results.iter().all(|(_, status)| status == "healthy");
        for (name, status) in results.iter().filter(|(_, s)| s != "healthy") {
            tracing::warn!(check = %name, status = %status, "Health check failed");
        }

        HealthReport {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            checks: results.into_iter().collect(),
        }
    }
}
