use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    scheduler::{SchedulerPolicy, SchedulerVariant},
    specialization::{Specialization, cluster_eligible},
    tile_table::supported_head_dims,
    variant_flags::VariantFlags,
};
use crate::{Architecture, DataType};

/// Element types kernels are compiled for.
pub const KERNEL_DATA_TYPES: [DataType; 4] = [DataType::F16, DataType::BF16, DataType::F8E4M3, DataType::F8E5M2];

/// Full specialization tuple of one compiled entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KernelKey {
    pub architecture: Architecture,
    pub head_dim: i32,
    pub cluster_m: i32,
    pub scheduler: SchedulerVariant,
    pub element: DataType,
    pub output: DataType,
    pub flags: VariantFlags,
}

impl KernelKey {
    pub fn new(
        specialization: &Specialization,
        flags: VariantFlags,
        scheduler: SchedulerVariant,
        cluster_m: i32,
    ) -> Self {
        Self {
            architecture: specialization.architecture,
            head_dim: specialization.head_dim,
            cluster_m,
            scheduler,
            element: specialization.element,
            output: specialization.output,
            flags,
        }
    }

    /// Symbol of the compiled kernel. Every axis has a fixed position, so
    /// distinct keys never share a name.
    pub fn entry_point(&self) -> String {
        let flags = &self.flags;
        format!(
            "hstu_fwd_{}_hdim{}_cluster{}_{}_{}_out_{}_mask_{}_ctx{}_jagged{}_targets{}_vcol{}_cross{}_softmax{}_training{}",
            self.architecture,
            self.head_dim,
            self.cluster_m,
            self.scheduler,
            self.element,
            self.output,
            flags.mask.name(),
            flags.contextual_mask as u8,
            flags.jagged as u8,
            flags.has_targets as u8,
            flags.v_colmajor as u8,
            flags.cross as u8,
            flags.softmax as u8,
            flags.training as u8,
        )
    }

    /// Every key a dispatch on `architecture` under `policy` can produce, in a
    /// stable order. This is the list of entry points the kernel build has to
    /// compile.
    pub fn enumerate(
        architecture: Architecture,
        policy: &SchedulerPolicy,
    ) -> Vec<KernelKey> {
        let generation = architecture.generation();
        let mut keys = Vec::new();
        for element in KERNEL_DATA_TYPES {
            for head_dim in supported_head_dims(architecture.supports_clusters(), element.size_in_bytes()) {
                for flags in VariantFlags::enumerate(element.is_fp8()) {
                    let Ok(specialization) = Specialization::select(architecture, head_dim, &flags, element) else {
                        continue;
                    };
                    let Ok(scheduler) = policy.select(flags.jagged, flags.mask, generation) else {
                        continue;
                    };
                    keys.push(KernelKey::new(&specialization, flags, scheduler, 1));
                    if cluster_eligible(architecture, element, head_dim, &flags) {
                        keys.push(KernelKey::new(&specialization, flags, scheduler, 2));
                    }
                }
            }
        }
        keys
    }
}

impl fmt::Display for KernelKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.entry_point())
    }
}
