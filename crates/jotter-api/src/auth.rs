//! Bearer-token identity.
//!
//! The shipped identity is a static single-user token: one configured
//! secret maps to one owner id. Requests without the token resolve to no
//! user, and the core rejects the operation before any store is touched.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use uuid::Uuid;

use jotter_core::Identity;

use crate::AppState;

/// Identity backed by one configured token/owner pair.
pub struct StaticTokenIdentity {
    token: String,
    owner: Uuid,
}

impl StaticTokenIdentity {
    pub fn new(token: impl Into<String>, owner: Uuid) -> Self {
        Self {
            token: token.into(),
            owner,
        }
    }
}

#[async_trait]
impl Identity for StaticTokenIdentity {
    async fn resolve(&self, credential: Option<&str>) -> Option<Uuid> {
        match credential {
            Some(token) if token == self.token => Some(self.owner),
            _ => None,
        }
    }
}

/// Extract the bearer token from the Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the requesting user, if any.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<Uuid> {
    state.identity.resolve(bearer_token(headers)).await
}
