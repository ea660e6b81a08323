use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ParseError};

/// Shared memory a kernel may use without the dynamic shared memory opt-in.
pub const DEFAULT_SHARED_MEMORY_LIMIT: usize = 48 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    Sm80,
    Sm86,
    Sm89,
    Sm90,
}

/// Hardware tier that owns a tile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// Ampere/Ada: multistage cp.async pipeline, no clusters.
    Sm8x,
    /// Hopper: warp specialized TMA pipeline, thread block clusters.
    Sm90,
}

impl Architecture {
    pub const ALL: [Architecture; 4] = [Architecture::Sm80, Architecture::Sm86, Architecture::Sm89, Architecture::Sm90];

    pub fn from_compute_capability(
        major: u32,
        minor: u32,
    ) -> Result<Self, ConfigurationError> {
        match (major, minor) {
            (8, 0) => Ok(Architecture::Sm80),
            (8, 6) | (8, 7) => Ok(Architecture::Sm86),
            (8, 9) => Ok(Architecture::Sm89),
            (9, 0) => Ok(Architecture::Sm90),
            _ => Err(ConfigurationError::UnsupportedArchitecture {
                major,
                minor,
            }),
        }
    }

    pub fn compute_capability(&self) -> u32 {
        match self {
            Architecture::Sm80 => 80,
            Architecture::Sm86 => 86,
            Architecture::Sm89 => 89,
            Architecture::Sm90 => 90,
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            Architecture::Sm90 => Generation::Sm90,
            Architecture::Sm80 | Architecture::Sm86 | Architecture::Sm89 => Generation::Sm8x,
        }
    }

    pub fn supports_clusters(&self) -> bool {
        self.generation() == Generation::Sm90
    }

    /// Consumer parts with fewer tensor cores and a smaller shared memory carveout.
    pub fn is_narrow_core(&self) -> bool {
        matches!(self, Architecture::Sm86 | Architecture::Sm89)
    }

    /// Largest dynamic shared memory a single block may opt into.
    pub fn max_shared_memory_per_block_optin(&self) -> usize {
        match self {
            Architecture::Sm80 => 163 * 1024,
            Architecture::Sm86 | Architecture::Sm89 => 99 * 1024,
            Architecture::Sm90 => 227 * 1024,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "sm{}", self.compute_capability())
    }
}

impl FromStr for Architecture {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches("sm_").trim_start_matches("sm");
        match digits {
            "80" => Ok(Architecture::Sm80),
            "86" => Ok(Architecture::Sm86),
            "89" => Ok(Architecture::Sm89),
            "90" | "90a" => Ok(Architecture::Sm90),
            _ => Err(ParseError::Architecture(s.to_string())),
        }
    }
}
