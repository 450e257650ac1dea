//! Session tokens issued by the search backend.

/// Header carrying the user-context marker the session was locked under.
pub const SESSION_MARKER_HEADER: &str = "x-centris-uc";

/// Header carrying the authentication token.
pub const AUTH_TOKEN_HEADER: &str = "x-centris-uck";

/// Tokens proving a legitimate browsing session.
///
/// Built once by the session manager and never mutated. The pagination
/// controller owns it and injects [`Session::headers`] into every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_context: u64,
    lock_token: String,
    auth_token: String,
}

impl Session {
    pub fn new(user_context: u64, lock_token: String, auth_token: String) -> Self {
        Self {
            user_context,
            lock_token,
            auth_token,
        }
    }

    /// User-context id the lock was taken for (the `uc` marker).
    pub fn user_context(&self) -> u64 {
        self.user_context
    }

    /// Opaque lock response body, exactly as received.
    pub fn lock_token(&self) -> &str {
        &self.lock_token
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Headers every API call made after the lock must carry.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            (
                SESSION_MARKER_HEADER.to_string(),
                self.user_context.to_string(),
            ),
            (AUTH_TOKEN_HEADER.to_string(), self.auth_token.clone()),
        ]
    }
}
