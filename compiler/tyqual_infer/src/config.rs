//! Contains the [`Config`] of an inference session.

use serde::{Deserialize, Serialize};

/// The tunable limits and policies of an inference session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The maximum number of incorporation work items a session may process
    /// before it gives up with an overflow.
    pub max_steps: usize,

    /// How deep least-upper-bound computation recurses into type arguments
    /// before falling back to an unbounded wildcard.
    pub lub_depth: usize,

    /// Whether a variable used in a throws position falls back to the
    /// unchecked exception root when it has no proper lower bound.
    pub throws_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_steps: 10_000, lub_depth: 2, throws_fallback: true }
    }
}

impl Config {
    /// Parses a config from TOML. Missing keys take their default value.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the source is malformed or contains an
    /// unknown key.
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Renders the config as TOML.
    ///
    /// # Errors
    ///
    /// See [`toml::ser::Error`].
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[cfg(test)]
mod test;
