use super::{arguments::KernelArguments, kernel::AttentionKernel, specialization};
use crate::backends::common::{LaunchGeometry, gpu_types::KernelParams};

/// Query tiles per (head, batch): `ceil(max_q_len / block_m)` rounded up to a
/// whole number of clusters.
pub fn num_query_tiles(
    max_q_len: i32,
    block_m: i32,
    cluster_m: i32,
) -> i32 {
    specialization::round_up(specialization::ceil_div(max_q_len, block_m), cluster_m.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchDescriptor {
    pub params: KernelParams,
    pub geometry: LaunchGeometry,
}

impl DispatchDescriptor {
    pub fn new<K: AttentionKernel>(
        kernel: &K,
        arguments: &KernelArguments,
    ) -> Self {
        let params = kernel.to_underlying_arguments(arguments);
        let geometry = LaunchGeometry {
            grid: kernel.grid_shape(&params),
            block: kernel.block_shape(),
            cluster: kernel.cluster_shape(),
            shared_memory_bytes: kernel.shared_storage_size(),
        };
        Self {
            params,
            geometry,
        }
    }
}
