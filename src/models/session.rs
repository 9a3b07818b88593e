use std::fmt;

use crate::errors::CallError;

/// Credentials for one caller, carried from the request into the call.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    auth_token: String,
}

impl SessionContext {
    pub fn new(auth_token: impl Into<String>) -> Result<Self, CallError> {
        let auth_token = auth_token.into();
        if auth_token.trim().is_empty() {
            return Err(CallError::MissingAuthToken);
        }
        Ok(Self { auth_token })
    }

    /// Builds a context from an `Authorization` header value.
    pub fn from_bearer(header: Option<&str>) -> Result<Self, CallError> {
        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .unwrap_or("");
        Self::new(token)
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("auth_token", &"<redacted>")
            .finish()
    }
}
