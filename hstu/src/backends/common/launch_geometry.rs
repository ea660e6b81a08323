use serde::{Deserialize, Serialize};

use super::GridSize;
use crate::architecture::DEFAULT_SHARED_MEMORY_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchGeometry {
    pub grid: GridSize,
    pub block: GridSize,
    pub cluster: GridSize,
    pub shared_memory_bytes: usize,
}

impl LaunchGeometry {
    pub fn requires_shared_memory_opt_in(&self) -> bool {
        self.shared_memory_bytes >= DEFAULT_SHARED_MEMORY_LIMIT
    }

    pub fn uses_cluster_launch(&self) -> bool {
        self.cluster.product() > 1
    }
}
