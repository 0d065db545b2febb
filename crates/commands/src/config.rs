//! Command stack configuration.

use serde::Deserialize;

/// Environment variable read by [`CommandStackConfig::from_env`].
pub const HISTORY_LIMIT_ENV: &str = "DRAFTBOARD_HISTORY_LIMIT";

/// Configuration for a [`CommandStack`](crate::CommandStack).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommandStackConfig {
    /// Maximum number of action groups kept in history (`None` = unlimited).
    ///
    /// When sealing a group would exceed the limit, the oldest group is dropped.
    history_limit: Option<usize>,
}

impl CommandStackConfig {
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Maximum number of action groups kept; never `Some(0)`.
    pub fn history_limit(&self) -> Option<usize> {
        self.history_limit.filter(|limit| *limit > 0)
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = (limit > 0).then_some(limit);
        self
    }

    /// Load from `DRAFTBOARD_HISTORY_LIMIT`; unset, `0` or unparsable means unlimited.
    pub fn from_env() -> Self {
        match std::env::var(HISTORY_LIMIT_ENV) {
            Ok(raw) => Self::from_limit_str(&raw),
            Err(_) => Self::default(),
        }
    }

    /// Parse a JSON document such as `{"history_limit": 50}`.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.history_limit = config.history_limit.filter(|limit| *limit > 0);
        Ok(config)
    }

    fn from_limit_str(raw: &str) -> Self {
        match raw.trim().parse::<usize>() {
            Ok(limit) => Self::default().with_history_limit(limit),
            Err(err) => {
                tracing::warn!(value = raw, error = %err, "ignoring invalid {HISTORY_LIMIT_ENV}");
                Self::default()
            }
        }
    }
}
