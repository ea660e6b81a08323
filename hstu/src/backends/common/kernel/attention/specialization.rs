use serde::{Deserialize, Serialize};

use super::{
    tile_table::{lookup_sm8x, lookup_sm90},
    variant_flags::{MaskMode, VariantFlags},
};
use crate::{Architecture, DataType, DispatchConfig, Generation, error::ConfigurationError};

/// Hopper pipelines K and V through a fixed two-stage TMA ring.
const SM90_STAGES: i32 = 2;
const WARP_SIZE: i32 = 32;
const WARP_GROUP_THREADS: i32 = 128;
/// Full and empty barrier per stage for each of K and V.
const SM90_BARRIER_BYTES_PER_STAGE: usize = 2 * 2 * 8;
/// Q and O barriers.
const SM90_FIXED_BARRIER_BYTES: usize = 2 * 8;

/// Compile-time shape of one kernel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specialization {
    pub architecture: Architecture,
    pub block_m: i32,
    pub block_n: i32,
    pub head_dim: i32,
    pub num_warps: i32,
    pub stages: i32,
    pub mma1_is_rs: bool,
    pub q_in_regs: bool,
    pub element: DataType,
    pub output: DataType,
}

impl Specialization {
    pub fn select(
        architecture: Architecture,
        head_dim: i32,
        flags: &VariantFlags,
        element: DataType,
    ) -> Result<Self, ConfigurationError> {
        let element_size = element.size_in_bytes();
        if element_size != 2 && element_size != 1 {
            return Err(ConfigurationError::UnsupportedDataType(element));
        }
        let unsupported = ConfigurationError::UnsupportedHeadDim {
            architecture,
            head_dim,
            element_size,
        };

        let specialization = match architecture.generation() {
            Generation::Sm90 => {
                let tile = lookup_sm90(head_dim, flags.mask, element_size, flags.v_colmajor, flags.cross, flags.training)
                    .ok_or(unsupported)?;
                let num_mma_threads = tile.block_m / 64 * WARP_GROUP_THREADS;
                Self {
                    architecture,
                    block_m: tile.block_m,
                    block_n: tile.block_n,
                    head_dim,
                    num_warps: (num_mma_threads + WARP_GROUP_THREADS) / WARP_SIZE,
                    stages: SM90_STAGES,
                    mma1_is_rs: tile.mma1_is_rs,
                    q_in_regs: false,
                    element,
                    output: element.kernel_output_type(),
                }
            },
            Generation::Sm8x => {
                let tile = lookup_sm8x(architecture.is_narrow_core(), head_dim, flags.mask, element_size)
                    .ok_or(unsupported)?;
                Self {
                    architecture,
                    block_m: tile.block_m,
                    block_n: tile.block_n,
                    head_dim,
                    num_warps: tile.num_warps,
                    stages: tile.stages,
                    mma1_is_rs: false,
                    q_in_regs: tile.q_in_regs,
                    element,
                    output: element.kernel_output_type(),
                }
            },
        };
        Ok(specialization)
    }

    pub fn generation(&self) -> Generation {
        self.architecture.generation()
    }

    pub fn num_mma_threads(&self) -> i32 {
        match self.generation() {
            Generation::Sm90 => self.block_m / 64 * WARP_GROUP_THREADS,
            Generation::Sm8x => self.num_warps * WARP_SIZE,
        }
    }

    /// Threads issuing loads. On sm8x the MMA threads load for themselves.
    pub fn num_producer_threads(&self) -> i32 {
        match self.generation() {
            Generation::Sm90 => WARP_GROUP_THREADS,
            Generation::Sm8x => self.num_mma_threads(),
        }
    }

    pub fn num_threads(&self) -> i32 {
        match self.generation() {
            Generation::Sm90 => self.num_mma_threads() + self.num_producer_threads(),
            Generation::Sm8x => self.num_mma_threads(),
        }
    }

    /// Bytes of shared storage the kernel declares.
    ///
    /// The O staging buffer aliases the Q buffer, which is dead once the
    /// mainloop finishes.
    pub fn shared_storage_size(&self) -> usize {
        let head_dim = self.head_dim as usize;
        let block_m = self.block_m as usize;
        let block_n = self.block_n as usize;
        let stages = self.stages as usize;
        let element_size = self.element.size_in_bytes();

        let q_bytes = block_m * head_dim * element_size;
        let o_bytes = block_m * head_dim * self.output.size_in_bytes();
        let kv_bytes = stages * block_n * head_dim * element_size * 2;

        match self.generation() {
            Generation::Sm90 => {
                q_bytes.max(o_bytes) + kv_bytes + stages * SM90_BARRIER_BYTES_PER_STAGE + SM90_FIXED_BARRIER_BYTES
            },
            Generation::Sm8x => q_bytes.max(o_bytes) + kv_bytes,
        }
    }

    /// Thread block cluster size along M.
    ///
    /// Clusters pay off for wide dense tiles; masked and jagged workloads keep
    /// single blocks. The query tile count must split evenly across the pair.
    pub fn cluster_m(
        &self,
        config: &DispatchConfig,
        flags: &VariantFlags,
        max_q_len: i32,
    ) -> i32 {
        let even_tiles = ceil_div(max_q_len, self.block_m) % 2 == 0;
        if config.enable_cluster && cluster_eligible(self.architecture, self.element, self.head_dim, flags) && even_tiles
        {
            2
        } else {
            1
        }
    }
}

/// Whether a 2x1x1 cluster variant of this configuration is compiled.
pub fn cluster_eligible(
    architecture: Architecture,
    element: DataType,
    head_dim: i32,
    flags: &VariantFlags,
) -> bool {
    let wide_enough = if element.size_in_bytes() == 2 {
        head_dim >= 128
    } else {
        head_dim == 192
    };
    architecture.supports_clusters() && wide_enough && flags.mask == MaskMode::None && !flags.jagged
}

/// `value / divisor` rounded up, for non-negative `value` and positive
/// `divisor`. Exact up to `i32::MAX`.
pub fn ceil_div(
    value: i32,
    divisor: i32,
) -> i32 {
    value / divisor + (value % divisor != 0) as i32
}

pub fn round_up(
    value: i32,
    multiple: i32,
) -> i32 {
    ceil_div(value, multiple) * multiple
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_div_does_not_overflow() {
        assert_eq!(ceil_div(i32::MAX, 128), 16_777_216);
        assert_eq!(ceil_div(i32::MAX, 1), i32::MAX);
        assert_eq!(ceil_div(256, 128), 2);
        assert_eq!(ceil_div(257, 128), 3);
        assert_eq!(ceil_div(0, 64), 0);
        assert_eq!(round_up(ceil_div(i32::MAX, 64), 2), 33_554_432);
    }
}
