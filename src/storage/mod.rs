// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Walrus Storage Module
//!
//! Blobs live on Walrus, a content-addressed storage network reached over
//! plain HTTP:
//!
//! - **Publishers** accept `PUT /v1/blobs?epochs=N` and answer with a
//!   `newlyCreated` or `alreadyCertified` confirmation carrying the blob id.
//! - **Aggregators** serve `GET /v1/blobs/{blob_id}`.
//!
//! Any aggregator can serve any blob regardless of which publisher stored
//! it, so endpoint failover is purely about reachability.
//!
//! ## Important Notes
//!
//! - Nothing is persisted locally
//! - Endpoint selection is an immutable [`EndpointPool`] value threaded by
//!   the caller; there is no global "current publisher"

pub mod endpoints;
pub mod walrus;

pub use endpoints::{
    find_working_endpoint, EndpointError, EndpointPool, Probe, PublisherProbe, Resolution,
    ResolutionOutcome,
};
pub use walrus::{
    Confirmation, ContentStore, FetchError, Fetched, Published, StoreError, StoreResponse,
    StoreSettings, StoredBlob,
};
