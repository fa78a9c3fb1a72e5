//! Credentials for the Harbor API

use harbor_core::Source;
use std::fmt;

/// Credential types supported
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Basic authentication (username/password), e.g. a Harbor robot account
    Basic { username: String, password: String },
}

impl Credentials {
    /// Create basic auth credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Credentials configured in the resource source, if any
    pub fn from_source(source: &Source) -> Option<Self> {
        source
            .basic_auth()
            .map(|(username, password)| Self::basic(username, password))
    }

    /// Value of the `Authorization` header
    pub fn auth_header(&self) -> String {
        match self {
            Credentials::Basic { username, password } => {
                let encoded = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    format!("{}:{}", username, password),
                );
                format!("Basic {}", encoded)
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}
