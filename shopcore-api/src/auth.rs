//! Bearer-token authentication.
//!
//! The API only needs to know which user a request acts for; how tokens are
//! issued and verified is behind the [`IdentityProvider`] seam. The bundled
//! [`StaticTokenProvider`] maps fixed tokens to users, which is all the
//! development server and tests need.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use shopcore::errors::CoreError;
use shopcore::types::UserId;

use crate::error::ApiError;
use crate::AppState;

/// Resolves a bearer token to a user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the user the token belongs to, or `None` if it is not valid.
    async fn authenticate(&self, token: &str) -> Option<UserId>;
}

/// Fixed token-to-user mapping for development and tests.
#[derive(Clone, Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenProvider {
    /// Creates an empty provider; every request will be rejected until
    /// tokens are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for a user, returning self for chaining.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user: UserId) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn authenticate(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token).copied()
    }
}

/// The authenticated user, extracted from the `Authorization` header.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub UserId);

impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                CoreError::Unauthorized("missing or malformed bearer token".to_string())
            })?;

        authenticate(&state.identity, token).await.map(Identity)
    }
}

async fn authenticate(
    provider: &Arc<dyn IdentityProvider>,
    token: &str,
) -> Result<UserId, ApiError> {
    provider
        .authenticate(token)
        .await
        .ok_or_else(|| CoreError::Unauthorized("invalid token".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_resolves_registered_tokens() {
        let user = UserId::new();
        let provider = StaticTokenProvider::new().with_token("secret", user);

        assert_eq!(provider.authenticate("secret").await, Some(user));
        assert_eq!(provider.authenticate("other").await, None);
    }
}
