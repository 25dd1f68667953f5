// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Sui full node reachability.
    pub sui_rpc: String,
    /// Latest checkpoint seen by the full node, when reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<u64>,
    /// Whether allowlist mutations can be signed.
    pub signer: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint handler.
///
/// Returns 200 if the full node answers, 503 otherwise. A missing signer is
/// reported but does not fail the check since reads still work.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let checkpoint = match state.sui.latest_checkpoint().await {
        Ok(seq) => Some(seq),
        Err(e) => {
            tracing::warn!(error = %e, "Sui RPC health check failed");
            None
        }
    };
    let all_ok = checkpoint.is_some();

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            sui_rpc: if all_ok { "ok" } else { "unavailable" }.to_string(),
            checkpoint,
            signer: if state.signer.is_some() { "ok" } else { "disabled" }.to_string(),
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
/// Does not check dependencies - use readiness for that.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{spawn_fake_sui, test_state, FakeChain};

    #[tokio::test]
    async fn ready_when_node_answers() {
        let url = spawn_fake_sui(FakeChain::new()).await;
        let (status, Json(body)) = readiness(State(test_state(url, None))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.checks.checkpoint, Some(42));
        assert_eq!(body.checks.signer, "disabled");
    }

    #[tokio::test]
    async fn degraded_when_node_is_down() {
        let state = test_state("http://127.0.0.1:9".parse().unwrap(), None);
        let (status, Json(body)) = health(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.checks.sui_rpc, "unavailable");
    }

    #[tokio::test]
    async fn liveness_is_unconditional() {
        assert_eq!(liveness().await.0.status, "ok");
    }
}
