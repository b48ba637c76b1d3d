//! Session identity types
//!
//! A session is identified by the `(server, database, username)` triple.
//! The password travels separately in `Credentials` so keys can be logged
//! and used as map keys without leaking secrets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one cached ERP client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientKey {
    pub server_url: String,
    pub database: String,
    pub username: String,
}

impl ClientKey {
    pub fn new(
        server_url: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            database: database.into(),
            username: username.into(),
        }
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.username, self.server_url, self.database)
    }
}

/// Secret half of a session
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    password: String,
}

impl Credentials {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("password", &"<redacted>").finish()
    }
}

/// User id returned by a successful authentication
///
/// Only positive ids are valid; the ERP answers `false` on rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(i64);

impl AuthToken {
    /// Returns `None` for non-positive ids
    pub fn new(uid: i64) -> Option<Self> {
        (uid > 0).then_some(Self(uid))
    }

    pub fn uid(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uid:{}", self.0)
    }
}

/// Authentication lifecycle of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientState {
    Uninitialized,
    Authenticating,
    Authenticated,
    /// The last attempt failed; the next call tries again
    AuthenticationFailed,
}

impl ClientState {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            ClientState::Uninitialized => 0,
            ClientState::Authenticating => 1,
            ClientState::Authenticated => 2,
            ClientState::AuthenticationFailed => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => ClientState::Authenticating,
            2 => ClientState::Authenticated,
            3 => ClientState::AuthenticationFailed,
            _ => ClientState::Uninitialized,
        }
    }
}
