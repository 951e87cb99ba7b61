use std::env;
use std::time::Duration;

use crate::domain::betting::BetMenu;
use crate::error::AppError;

pub const DEFAULT_GRACE_SECS: u64 = 30;
pub const DEFAULT_STARTING_BALANCE: u64 = 1000;

/// Runtime knobs for the engine, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// How long an opponent may stay disconnected before forfeiting.
    pub disconnect_grace: Duration,
    pub bet_menu: BetMenu,
    /// Seed balance for players the simulator creates.
    pub starting_balance: u64,
    /// Relational ledger; `None` selects the in-memory ledger.
    pub database_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            disconnect_grace: Duration::from_secs(DEFAULT_GRACE_SECS),
            bet_menu: BetMenu::default(),
            starting_balance: DEFAULT_STARTING_BALANCE,
            database_url: None,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build from `DOMINO_*` and `DATABASE_URL` environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset variables fall back to
    /// defaults, malformed ones are configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("DOMINO_DISCONNECT_GRACE_SECS") {
            config.disconnect_grace = Duration::from_secs(parse_u64(
                "DOMINO_DISCONNECT_GRACE_SECS",
                &raw,
            )?);
        }
        if let Some(raw) = lookup("DOMINO_BET_MENU") {
            config.bet_menu = parse_menu(&raw)?;
        }
        if let Some(raw) = lookup("DOMINO_STARTING_BALANCE") {
            config.starting_balance = parse_u64("DOMINO_STARTING_BALANCE", &raw)?;
        }
        config.database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        Ok(config)
    }
}

pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn disconnect_grace(mut self, grace: Duration) -> Self {
        self.config.disconnect_grace = grace;
        self
    }

    pub fn bet_menu(mut self, menu: BetMenu) -> Self {
        self.config.bet_menu = menu;
        self
    }

    pub fn starting_balance(mut self, balance: u64) -> Self {
        self.config.starting_balance = balance;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

fn parse_u64(name: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| AppError::config(format!("'{name}' must be a non-negative integer, got '{raw}': {e}")))
}

fn parse_menu(raw: &str) -> Result<BetMenu, AppError> {
    let amounts = raw
        .split(',')
        .map(|part| parse_u64("DOMINO_BET_MENU", part))
        .collect::<Result<Vec<_>, _>>()?;
    BetMenu::new(amounts).map_err(|e| AppError::config(format!("'DOMINO_BET_MENU': {e}")))
}
