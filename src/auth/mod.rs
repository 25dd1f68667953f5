// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Allowlist mutations through the proxy are gated by a static admin bearer
//! token.
//!
//! ## Auth Flow
//!
//! 1. The operator sets `PROXY_ADMIN_TOKEN`
//! 2. Clients send `Authorization: Bearer <token>` on `POST /whitelist`
//! 3. The server compares digests and rejects mismatches with 403
//!
//! ## Development Mode
//!
//! With no token configured every request is accepted and a warning is
//! logged. Read endpoints never require authentication.

pub mod error;
pub mod extractor;
pub mod token;

pub use error::AuthError;
pub use extractor::AdminAuth;
pub use token::AdminToken;
