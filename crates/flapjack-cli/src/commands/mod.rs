pub mod challenge;
pub mod config;
pub mod live;
pub mod status;

use std::sync::Arc;

use chrono::Local;
use flapjack_core::countdown::format_clock;
use flapjack_core::{AdminList, Config, SqliteStore};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Everything a command needs from the environment.
pub struct AppContext {
    pub config: Config,
    pub identity: Option<String>,
    pub admins: AdminList,
}

impl AppContext {
    pub fn load(identity: Option<String>) -> CliResult<Self> {
        let config = Config::load()?;
        let identity = identity
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .or_else(|| config.identity().map(str::to_string));
        let admins = AdminList::from_config(&config.admin);
        Ok(Self {
            config,
            identity,
            admins,
        })
    }

    pub fn open_store(&self) -> CliResult<Arc<SqliteStore>> {
        let path = self.config.store_path()?;
        tracing::debug!(path = %path.display(), "opening challenge store");
        Ok(Arc::new(SqliteStore::open(&path)?))
    }

    /// Refuse unless the current identity is on the admin list.
    pub fn require_admin(&self) -> CliResult {
        if self.admins.is_empty() {
            tracing::warn!("no admin identities configured; set admin.identities");
        }
        self.admins.authorize(self.identity.as_deref())?;
        Ok(())
    }

    /// Wall clock line, if enabled.
    pub fn clock_line(&self) -> Option<String> {
        self.config
            .display
            .show_clock
            .then(|| format_clock(&Local::now()))
    }
}
