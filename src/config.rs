//! Process-level settings.

use crate::{db_info, db_warn};
use crate::debugger::{Component, DebugLevel, set_debug_level};

/// Environment variable holding the diagnostic level.
pub const LOG_ENV_VAR: &str = "TABULA_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub debug_level: DebugLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug_level: DebugLevel::Warn,
        }
    }
}

impl Config {
    /// Reads [`LOG_ENV_VAR`]; an unrecognised level keeps the default.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(raw) = std::env::var(LOG_ENV_VAR) {
            config.debug_level = Self::parse_level(&raw).unwrap_or(config.debug_level);
        }
        config
    }

    pub fn with_debug_level(mut self, level: DebugLevel) -> Self {
        self.debug_level = level;
        self
    }

    pub fn apply(&self) {
        set_debug_level(self.debug_level);
        db_info!(Component::Pipeline, "diagnostics at {:?}", self.debug_level);
    }

    fn parse_level(raw: &str) -> Option<DebugLevel> {
        match DebugLevel::by_name(raw) {
            Ok(level) => Some(level),
            Err(err) => {
                db_warn!(Component::Pipeline, "{}={:?} ignored: {}", LOG_ENV_VAR, raw, err);
                None
            }
        }
    }
}
