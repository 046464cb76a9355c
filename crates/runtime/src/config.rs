//! Runtime configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How much lineage the runtime maintains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineageMode {
    /// No lineage is recorded.
    Disabled,
    /// Lineage is recorded for every output, results are always computed.
    Trace,
    /// Lineage is recorded and equivalent computations are served from the
    /// reuse cache.
    #[default]
    Reuse,
}

impl LineageMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LineageMode::Disabled => "disabled",
            LineageMode::Trace => "trace",
            LineageMode::Reuse => "reuse",
        }
    }

    pub fn records(self) -> bool {
        !matches!(self, LineageMode::Disabled)
    }

    pub fn reuses(self) -> bool {
        matches!(self, LineageMode::Reuse)
    }
}

impl FromStr for LineageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(LineageMode::Disabled),
            "trace" => Ok(LineageMode::Trace),
            "reuse" => Ok(LineageMode::Reuse),
            other => Err(format!(
                "unknown lineage mode '{other}' (expected disabled, trace or reuse)"
            )),
        }
    }
}

impl fmt::Display for LineageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for a [`crate::Runtime`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub lineage: LineageMode,
    /// Admission cap for the reuse cache; `None` is unbounded.
    pub max_cache_entries: Option<usize>,
}
