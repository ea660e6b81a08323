use std::fmt;

use serde::{Deserialize, Serialize};

use super::{dispatch_descriptor::DispatchDescriptor, kernel_key::KernelKey, shared_memory::SharedMemoryOptIns};
use crate::{
    backends::common::{Backend, LaunchGeometry},
    error::DispatchError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchPath {
    Cluster,
    Standard,
}

impl LaunchPath {
    pub fn for_geometry(geometry: &LaunchGeometry) -> Self {
        if geometry.uses_cluster_launch() {
            LaunchPath::Cluster
        } else {
            LaunchPath::Standard
        }
    }
}

impl fmt::Display for LaunchPath {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            LaunchPath::Cluster => f.write_str("cluster"),
            LaunchPath::Standard => f.write_str("standard"),
        }
    }
}

/// Issues launches, raising the shared memory ceiling first when needed.
#[derive(Debug, Default)]
pub struct KernelInvoker {
    shared_memory: SharedMemoryOptIns,
}

impl KernelInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared_memory(&self) -> &SharedMemoryOptIns {
        &self.shared_memory
    }

    /// Enqueues `descriptor` on `stream`. Backend failures are returned as is;
    /// they point at the environment, so nothing is retried.
    pub fn invoke<B: Backend>(
        &self,
        backend: &B,
        device: i32,
        key: &KernelKey,
        function: &B::Function,
        descriptor: &DispatchDescriptor,
        stream: &B::Stream,
    ) -> Result<LaunchPath, DispatchError<B::Error>> {
        let geometry = &descriptor.geometry;

        if geometry.requires_shared_memory_opt_in() {
            self.shared_memory.ensure(backend, device, key, function, geometry.shared_memory_bytes).map_err(
                |source| DispatchError::SharedMemoryOptIn {
                    entry_point: key.entry_point(),
                    bytes: geometry.shared_memory_bytes,
                    source,
                },
            )?;
        }

        let path = LaunchPath::for_geometry(geometry);
        match path {
            LaunchPath::Cluster => {
                backend.launch_on_cluster(function, geometry, &descriptor.params, stream).map_err(|source| {
                    DispatchError::ClusterLaunch {
                        entry_point: key.entry_point(),
                        source,
                    }
                })?
            },
            LaunchPath::Standard => {
                backend.launch(function, geometry, &descriptor.params, stream).map_err(|source| DispatchError::Launch {
                    entry_point: key.entry_point(),
                    source,
                })?
            },
        }
        log::debug!("launched {key} via {path} path: grid {} block {}", geometry.grid, geometry.block);
        Ok(path)
    }
}
