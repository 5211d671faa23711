//! Request context passed to every collaborator call
//!
//! The auth token travels explicitly with each request rather than living
//! in global state, so a session can be driven with any credentials.

use serde::{Deserialize, Serialize};

/// Credentials for one backend call
///
/// # Example
///
/// ```rust
/// use export_config_sdk::auth::RequestContext;
///
/// let ctx = RequestContext::new("token123");
/// assert_eq!(ctx.authorization_header().as_deref(), Some("Bearer token123"));
///
/// let anonymous = RequestContext::anonymous();
/// assert!(anonymous.authorization_header().is_none());
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    auth_token: Option<String>,
}

impl RequestContext {
    pub fn new(auth_token: impl Into<String>) -> Self {
        let token = auth_token.into();
        Self {
            auth_token: (!token.trim().is_empty()).then_some(token),
        }
    }

    pub fn anonymous() -> Self {
        Self { auth_token: None }
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Value for the `Authorization` header, if a token is present
    pub fn authorization_header(&self) -> Option<String> {
        self.auth_token
            .as_ref()
            .map(|token| format!("Bearer {}", token))
    }
}

// Tokens never end up in logs.
impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl From<Option<String>> for RequestContext {
    fn from(token: Option<String>) -> Self {
        token.map(RequestContext::new).unwrap_or_default()
    }
}
