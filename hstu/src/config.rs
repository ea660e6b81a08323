use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub const ENABLE_CLUSTER_ENV: &str = "HSTU_ENABLE_CLUSTER";

static ENV_CONFIG: OnceLock<DispatchConfig> = OnceLock::new();

/// Knobs that change which specializations a dispatch may pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Launch 2x1x1 thread block clusters on Hopper for dense, non-jagged
    /// workloads with an even number of query tiles.
    pub enable_cluster: bool,
}

impl DispatchConfig {
    /// Configuration read from the environment. Read once per process.
    pub fn from_env() -> Self {
        *ENV_CONFIG.get_or_init(|| Self {
            enable_cluster: std::env::var(ENABLE_CLUSTER_ENV).ok().and_then(|value| parse_flag(&value)).unwrap_or(false),
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
