use serde::{Deserialize, Serialize};

use crate::error::{BuildError, BuildResult};

/// How the finished blob's length is rounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalAlignment {
    /// Pad to the root type's natural alignment.
    Natural,
    /// Pad to a fixed power of two.
    Fixed(usize),
}

/// Configuration for turning a builder into a blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Rounding applied to the final length.
    pub final_alignment: FinalAlignment,
    /// Bytes reserved up front in the stream.
    pub initial_capacity: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            final_alignment: FinalAlignment::Natural,
            initial_capacity: 256,
        }
    }
}

impl BuildConfig {
    /// Matches the host runtime, whose allocator hands out 16-byte blocks.
    pub fn host_compatible() -> Self {
        Self {
            final_alignment: FinalAlignment::Fixed(16),
            ..Default::default()
        }
    }

    pub fn from_toml_str(source: &str) -> BuildResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|err| BuildError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BuildResult<()> {
        if let FinalAlignment::Fixed(alignment) = self.final_alignment {
            if !alignment.is_power_of_two() {
                return Err(BuildError::Config(format!(
                    "final alignment must be a positive power of two, got {alignment}"
                )));
            }
        }
        Ok(())
    }

    /// The alignment to pad to, given the root's natural alignment.
    pub fn resolve_alignment(&self, natural: usize) -> usize {
        match self.final_alignment {
            FinalAlignment::Natural => natural,
            FinalAlignment::Fixed(alignment) => alignment,
        }
    }
}
