//! Store configuration (capacity and buffer limits).

use serde::{Deserialize, Serialize};

use crate::error::{PseError, PseResult};

/// Limits applied to a single variable store.
///
/// Defaults: 2000 variables per agent, 50-byte names, 1000-byte string
/// buffers and 10 000 attempts per rejection loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of live variables.
    pub max_variables: usize,
    /// Maximum variable name length in bytes.
    pub max_name_len: usize,
    /// Length of the fixed buffer backing each string element.
    pub max_string_len: usize,
    /// Cap on each rejection-sampling loop of a string mutation.
    pub max_rejection_attempts: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_variables: 2000,
            max_name_len: 50,
            max_string_len: 1000,
            max_rejection_attempts: 10_000,
        }
    }
}

impl StoreConfig {
    /// Validate the limits.
    ///
    /// # Errors
    ///
    /// Returns `PseError::InvalidConfig` if any limit is zero.
    pub fn validate(&self) -> PseResult<()> {
        let zero = [
            ("max_variables", self.max_variables),
            ("max_name_len", self.max_name_len),
            ("max_string_len", self.max_string_len),
            ("max_rejection_attempts", self.max_rejection_attempts),
        ]
        .into_iter()
        .find(|(_, v)| *v == 0);

        if let Some((field, _)) = zero {
            return Err(PseError::InvalidConfig {
                reason: format!("{field} must be > 0"),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON document. Missing fields take their default.
    ///
    /// # Errors
    ///
    /// Returns `PseError::InvalidConfig` if the document is malformed or the
    /// resulting limits do not validate.
    pub fn from_json_str(json: &str) -> PseResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| PseError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
