//! Admin gating: who may issue mutation commands.

use std::collections::HashSet;

use crate::error::CommandError;
use crate::storage::AdminConfig;

/// Fixed allow-list of identities (typically email addresses).
#[derive(Debug, Clone, Default)]
pub struct AdminList {
    identities: HashSet<String>,
}

impl AdminList {
    pub fn new<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identities: identities
                .into_iter()
                .map(Into::into)
                .map(|s: String| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(config.identities.iter().cloned())
    }

    /// Exact membership check. An empty identity is never an admin.
    pub fn is_admin(&self, identity: &str) -> bool {
        let identity = identity.trim();
        !identity.is_empty() && self.identities.contains(identity)
    }

    /// Like [`is_admin`](Self::is_admin) but for a possibly absent identity,
    /// as a command refusal.
    pub fn authorize(&self, identity: Option<&str>) -> Result<(), CommandError> {
        match identity {
            Some(id) if self.is_admin(id) => Ok(()),
            other => Err(CommandError::NotAuthorized {
                identity: other.unwrap_or("anonymous").to_string(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
