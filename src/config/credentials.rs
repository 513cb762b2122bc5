use crate::{Error, Result};
use std::fmt;

/// Bearer token for the CreateAI endpoints.
#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Reads the token from `var`. An unset or blank variable is an error;
    /// there is no fallback token.
    pub fn from_env(var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Ok(Self::new(token.trim())),
            _ => Err(Error::MissingCredential {
                var: var.to_string(),
            }),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// First few characters of the token, for log lines.
    pub fn redacted(&self) -> String {
        let prefix: String = self.token.chars().take(8).collect();
        format!("{prefix}...")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.redacted())
            .finish()
    }
}
