// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Endpoint pool resolution.
//!
//! Publisher and aggregator nodes are run by independent operators and are
//! not always reachable. [`find_working_endpoint`] probes candidates in list
//! order, in batches of [`PROBE_BATCH_SIZE`] run concurrently, and returns a
//! new [`EndpointPool`] pointing at the first healthy one. Pools are plain
//! values; nothing is mutated in place.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use url::Url;

/// Candidates probed concurrently per batch.
pub const PROBE_BATCH_SIZE: usize = 5;

/// Default probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("Endpoint pool is empty")]
    EmptyPool,

    #[error("No healthy endpoint among {tried} candidates")]
    Unavailable { tried: usize },
}

/// Ordered candidates plus the currently selected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPool {
    candidates: Arc<[Url]>,
    selected: usize,
}

impl EndpointPool {
    /// Pool selecting the first candidate.
    pub fn new(candidates: Vec<Url>) -> Result<Self, EndpointError> {
        if candidates.is_empty() {
            return Err(EndpointError::EmptyPool);
        }
        Ok(Self {
            candidates: candidates.into(),
            selected: 0,
        })
    }

    pub fn selected(&self) -> &Url {
        &self.candidates[self.selected]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn candidates(&self) -> &[Url] {
        &self.candidates
    }

    /// Same candidates, different selection. Out-of-range indexes keep the
    /// current selection.
    pub fn select(&self, index: usize) -> Self {
        Self {
            candidates: Arc::clone(&self.candidates),
            selected: if index < self.candidates.len() { index } else { self.selected },
        }
    }

    /// Candidate indexes starting at the selection and wrapping around.
    pub fn failover_order(&self) -> impl Iterator<Item = usize> + '_ {
        let len = self.candidates.len();
        (0..len).map(move |offset| (self.selected + offset) % len)
    }
}

/// Whether the search found a healthy endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Healthy,
    /// Nothing passed; the first candidate is selected as a best effort.
    Fallback,
}

/// Result of one search episode.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub pool: EndpointPool,
    /// Every candidate probed during this search, in list order
    pub tried: Vec<Url>,
    pub outcome: ResolutionOutcome,
}

impl Resolution {
    pub fn is_healthy(&self) -> bool {
        self.outcome == ResolutionOutcome::Healthy
    }

    /// The pool, or an error when the search fell back.
    pub fn into_healthy(self) -> Result<EndpointPool, EndpointError> {
        match self.outcome {
            ResolutionOutcome::Healthy => Ok(self.pool),
            ResolutionOutcome::Fallback => Err(EndpointError::Unavailable {
                tried: self.tried.len(),
            }),
        }
    }
}

/// Liveness check for a single endpoint.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, endpoint: &Url) -> bool;
}

/// Probes a publisher with a 1-byte, 1-epoch store. Only HTTP 200 passes.
#[derive(Clone)]
pub struct PublisherProbe {
    http: reqwest::Client,
    timeout: Duration,
}

impl PublisherProbe {
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

#[async_trait]
impl Probe for PublisherProbe {
    async fn probe(&self, endpoint: &Url) -> bool {
        let url = format!("{}/v1/blobs?epochs=1", base(endpoint));
        match self
            .http
            .put(&url)
            .body(vec![1u8])
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                tracing::debug!(endpoint = %endpoint, "Publisher probe passed");
                true
            }
            Ok(response) => {
                tracing::debug!(
                    endpoint = %endpoint,
                    status = %response.status(),
                    "Publisher probe failed"
                );
                false
            }
            Err(e) => {
                tracing::debug!(endpoint = %endpoint, error = %e, "Publisher probe failed");
                false
            }
        }
    }
}

/// Base URL without a trailing slash, for appending API paths.
pub(crate) fn base(endpoint: &Url) -> &str {
    endpoint.as_str().trim_end_matches('/')
}

/// Probe `pool` in batches and select the first healthy candidate.
///
/// Batches run sequentially in list order; probes within a batch run
/// concurrently and the whole batch settles before the next one starts.
/// Failed candidates are not retried. If nothing passes, the first
/// candidate is selected and the outcome is [`ResolutionOutcome::Fallback`].
pub async fn find_working_endpoint(pool: &EndpointPool, probe: &dyn Probe) -> Resolution {
    let candidates = pool.candidates();
    let mut tried = Vec::new();

    tracing::info!(candidates = candidates.len(), "Searching for a working endpoint");

    for (batch_index, batch) in candidates.chunks(PROBE_BATCH_SIZE).enumerate() {
        let results = join_all(batch.iter().map(|endpoint| probe.probe(endpoint))).await;
        tried.extend(batch.iter().cloned());

        if let Some(offset) = results.iter().position(|healthy| *healthy) {
            let index = batch_index * PROBE_BATCH_SIZE + offset;
            tracing::info!(
                endpoint = %candidates[index],
                tried = tried.len(),
                "Found working endpoint"
            );
            return Resolution {
                pool: pool.select(index),
                tried,
                outcome: ResolutionOutcome::Healthy,
            };
        }
    }

    tracing::warn!(
        fallback = %candidates[0],
        tried = tried.len(),
        "No working endpoint found, falling back to first candidate"
    );
    Resolution {
        pool: pool.select(0),
        tried,
        outcome: ResolutionOutcome::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use axum::{http::StatusCode, routing::put, Router};

    use crate::testing::{serve, spawn_fake_walrus, FakeWalrus, NodeMode};

    fn urls(n: usize) -> Vec<Url> {
        (0..n)
            .map(|i| format!("http://node-{i}.test").parse().unwrap())
            .collect()
    }

    /// Healthy set plus a log of probed endpoints.
    struct ScriptedProbe {
        healthy: HashSet<Url>,
        probed: Mutex<Vec<Url>>,
    }

    impl ScriptedProbe {
        fn new(healthy: impl IntoIterator<Item = Url>) -> Self {
            Self {
                healthy: healthy.into_iter().collect(),
                probed: Mutex::new(Vec::new()),
            }
        }

        fn probed(&self) -> Vec<Url> {
            self.probed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn probe(&self, endpoint: &Url) -> bool {
            self.probed.lock().unwrap().push(endpoint.clone());
            self.healthy.contains(endpoint)
        }
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert_eq!(EndpointPool::new(vec![]), Err(EndpointError::EmptyPool));
    }

    #[test]
    fn failover_order_wraps_from_selection() {
        let pool = EndpointPool::new(urls(4)).unwrap().select(2);
        assert_eq!(pool.failover_order().collect::<Vec<_>>(), vec![2, 3, 0, 1]);
        assert_eq!(pool.select(10).selected_index(), 2);
    }

    #[tokio::test]
    async fn picks_first_healthy_in_list_order() {
        let candidates = urls(8);
        let pool = EndpointPool::new(candidates.clone()).unwrap();
        let probe = ScriptedProbe::new([candidates[4].clone(), candidates[2].clone()]);

        let resolution = find_working_endpoint(&pool, &probe).await;
        assert!(resolution.is_healthy());
        assert_eq!(resolution.pool.selected(), &candidates[2]);
        assert_eq!(resolution.tried, candidates[..5].to_vec());
        // Second batch never probed
        assert_eq!(probe.probed().len(), 5);
    }

    #[tokio::test]
    async fn moves_to_next_batch_only_after_failure() {
        let candidates = urls(12);
        let pool = EndpointPool::new(candidates.clone()).unwrap();
        let probe = ScriptedProbe::new([candidates[7].clone()]);

        let resolution = find_working_endpoint(&pool, &probe).await;
        assert_eq!(resolution.pool.selected_index(), 7);
        assert_eq!(resolution.tried.len(), 10);
    }

    #[tokio::test]
    async fn falls_back_to_first_candidate() {
        let candidates = urls(7);
        let pool = EndpointPool::new(candidates.clone()).unwrap().select(3);
        let probe = ScriptedProbe::new([]);

        let resolution = find_working_endpoint(&pool, &probe).await;
        assert_eq!(resolution.outcome, ResolutionOutcome::Fallback);
        assert_eq!(resolution.pool.selected(), &candidates[0]);
        assert_eq!(resolution.tried, candidates);
        assert_eq!(
            resolution.into_healthy(),
            Err(EndpointError::Unavailable { tried: 7 })
        );
    }

    #[tokio::test]
    async fn repeated_searches_agree_when_all_healthy() {
        let candidates = urls(6);
        let pool = EndpointPool::new(candidates.clone()).unwrap();
        let probe = ScriptedProbe::new(candidates.clone());

        let first = find_working_endpoint(&pool, &probe).await;
        let second = find_working_endpoint(&first.pool, &probe).await;
        assert_eq!(first.pool.selected(), &candidates[0]);
        assert_eq!(first.pool, second.pool);
    }

    #[tokio::test]
    async fn publisher_probe_requires_200() {
        let ok = serve(Router::new().route("/v1/blobs", put(|| async { StatusCode::OK }))).await;
        let created =
            serve(Router::new().route("/v1/blobs", put(|| async { StatusCode::CREATED }))).await;
        let broken = serve(Router::new().route(
            "/v1/blobs",
            put(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let unreachable: Url = "http://127.0.0.1:9".parse().unwrap();

        let probe = PublisherProbe::new(reqwest::Client::new(), Duration::from_secs(2));
        assert!(probe.probe(&ok).await);
        assert!(!probe.probe(&created).await);
        assert!(!probe.probe(&broken).await);
        assert!(!probe.probe(&unreachable).await);
    }

    #[tokio::test]
    async fn hanging_batch_costs_one_timeout() {
        let hanging = Router::new().route(
            "/v1/blobs",
            put(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::OK
            }),
        );
        let mut candidates = Vec::new();
        for _ in 0..PROBE_BATCH_SIZE {
            candidates.push(serve(hanging.clone()).await);
        }
        candidates.push(spawn_fake_walrus(FakeWalrus::new(), NodeMode::Healthy).await);
        let pool = EndpointPool::new(candidates).unwrap();

        let checker = PublisherProbe::new(reqwest::Client::new(), Duration::from_secs(1));
        let started = std::time::Instant::now();
        let resolution = find_working_endpoint(&pool, &checker).await;
        let elapsed = started.elapsed();

        assert!(resolution.is_healthy());
        assert_eq!(resolution.pool.selected_index(), 5);
        assert_eq!(resolution.tried.len(), 6);
        // The first batch times out together, not one after another
        assert!(elapsed >= Duration::from_secs(1), "took {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    }
}
