use super::{arguments::KernelArguments, scheduler::SchedulerVariant, specialization::Specialization};
use crate::backends::common::{GridSize, gpu_types::KernelParams};

/// Host side contract of a compiled attention kernel.
pub trait AttentionKernel {
    fn to_underlying_arguments(
        &self,
        arguments: &KernelArguments,
    ) -> KernelParams;

    fn grid_shape(
        &self,
        params: &KernelParams,
    ) -> GridSize;

    fn block_shape(&self) -> GridSize;

    fn cluster_shape(&self) -> GridSize;

    fn shared_storage_size(&self) -> usize;
}

/// Sizing mirror of the fused forward kernel for one specialization,
/// scheduler and cluster size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashForwardKernel {
    specialization: Specialization,
    scheduler: SchedulerVariant,
    cluster_m: i32,
}

impl FlashForwardKernel {
    pub fn new(
        specialization: Specialization,
        scheduler: SchedulerVariant,
        cluster_m: i32,
    ) -> Self {
        Self {
            specialization,
            scheduler,
            cluster_m,
        }
    }

    pub fn specialization(&self) -> &Specialization {
        &self.specialization
    }

    pub fn scheduler(&self) -> SchedulerVariant {
        self.scheduler
    }
}

impl AttentionKernel for FlashForwardKernel {
    fn to_underlying_arguments(
        &self,
        arguments: &KernelArguments,
    ) -> KernelParams {
        let specialization = &self.specialization;
        KernelParams {
            mainloop: arguments.mainloop,
            epilogue: arguments.epilogue,
            scheduler: arguments.scheduler,
            hardware: arguments.hardware,
            tile_shape: [specialization.block_m, specialization.block_n, specialization.head_dim],
            cluster_shape: [self.cluster_m, 1, 1],
            num_mma_threads: specialization.num_mma_threads(),
            num_producer_threads: specialization.num_producer_threads(),
        }
    }

    fn grid_shape(
        &self,
        params: &KernelParams,
    ) -> GridSize {
        let scheduler = &params.scheduler;
        let num_blocks_m = scheduler.num_blocks_m.max(0) as usize;
        let num_heads = scheduler.num_heads.max(0) as usize;
        let num_batch = scheduler.num_batch.max(0) as usize;
        let sm_count = params.hardware.sm_count.max(1) as usize;
        let cluster_m = self.cluster_m.max(1) as usize;

        let persistent_blocks = |blocks: usize| (blocks / cluster_m * cluster_m).max(cluster_m);

        match self.scheduler {
            SchedulerVariant::SingleTile => GridSize::new(num_blocks_m, num_heads, num_batch),
            SchedulerVariant::StaticPersistent => {
                let total_tiles = num_blocks_m * num_heads * num_batch;
                GridSize::new(persistent_blocks(sm_count.min(total_tiles)), 1, 1)
            },
            SchedulerVariant::DynamicPersistent | SchedulerVariant::VarlenDynamicPersistent => {
                GridSize::new(persistent_blocks(sm_count), 1, 1)
            },
        }
    }

    fn block_shape(&self) -> GridSize {
        GridSize::new(self.specialization.num_threads() as usize, 1, 1)
    }

    fn cluster_shape(&self) -> GridSize {
        GridSize::new(self.cluster_m.max(1) as usize, 1, 1)
    }

    fn shared_storage_size(&self) -> usize {
        self.specialization.shared_storage_size()
    }
}
