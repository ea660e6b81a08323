use std::{collections::HashMap, fmt};

use parking_lot::Mutex;
use serde::Serialize;

use super::{
    arguments::KernelArguments,
    dispatch_descriptor::DispatchDescriptor,
    invoker::{KernelInvoker, LaunchPath},
    kernel::FlashForwardKernel,
    kernel_key::KernelKey,
    scheduler::{SchedulerPolicy, SchedulerVariant},
    specialization::Specialization,
    variant_flags::VariantFlags,
};
use crate::{
    Architecture, DispatchConfig,
    backends::common::{Backend, LaunchGeometry, gpu_types::KernelParams},
    error::{ConfigurationError, DispatchError},
    parameters::ForwardParameters,
};

/// Everything resolved for one call, before anything touches the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchPlan {
    pub key: KernelKey,
    pub entry_point: String,
    pub specialization: Specialization,
    pub scheduler: SchedulerVariant,
    pub params: KernelParams,
    pub geometry: LaunchGeometry,
}

impl LaunchPlan {
    pub fn launch_path(&self) -> LaunchPath {
        LaunchPath::for_geometry(&self.geometry)
    }

    pub fn descriptor(&self) -> DispatchDescriptor {
        DispatchDescriptor {
            params: self.params,
            geometry: self.geometry,
        }
    }
}

impl fmt::Display for LaunchPlan {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let specialization = &self.specialization;
        writeln!(f, "entry point:   {}", self.entry_point)?;
        writeln!(
            f,
            "tile:          block_m={} block_n={} head_dim={}",
            specialization.block_m, specialization.block_n, specialization.head_dim
        )?;
        writeln!(
            f,
            "pipeline:      warps={} stages={} mma1_is_rs={} q_in_regs={}",
            specialization.num_warps, specialization.stages, specialization.mma1_is_rs, specialization.q_in_regs
        )?;
        writeln!(f, "scheduler:     {} (query tiles {})", self.scheduler, self.params.scheduler.num_blocks_m)?;
        writeln!(f, "grid:          {}", self.geometry.grid)?;
        writeln!(f, "block:         {}", self.geometry.block)?;
        writeln!(f, "cluster:       {} ({} launch)", self.geometry.cluster, self.launch_path())?;
        write!(
            f,
            "shared memory: {} bytes{}",
            self.geometry.shared_memory_bytes,
            if self.geometry.requires_shared_memory_opt_in() {
                " (opt-in)"
            } else {
                ""
            }
        )
    }
}

/// Dispatcher for the fused jagged attention forward kernels of one
/// architecture.
pub struct FlashAttentionForward<B: Backend> {
    backend: B,
    architecture: Architecture,
    config: DispatchConfig,
    scheduler_policy: SchedulerPolicy,
    functions: Mutex<HashMap<(i32, KernelKey), B::Function>>,
    invoker: KernelInvoker,
}

impl<B: Backend> FlashAttentionForward<B> {
    pub fn new(
        backend: B,
        architecture: Architecture,
        config: DispatchConfig,
    ) -> Self {
        Self {
            backend,
            architecture,
            config,
            scheduler_policy: SchedulerPolicy::default(),
            functions: Mutex::new(HashMap::new()),
            invoker: KernelInvoker::new(),
        }
    }

    pub fn with_scheduler_policy(
        mut self,
        scheduler_policy: SchedulerPolicy,
    ) -> Self {
        self.scheduler_policy = scheduler_policy;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn invoker(&self) -> &KernelInvoker {
        &self.invoker
    }

    pub fn scheduler_policy(&self) -> &SchedulerPolicy {
        &self.scheduler_policy
    }

    /// Entry points this dispatcher can resolve to. Each one has to exist in
    /// the loaded kernels.
    pub fn manifest(&self) -> Vec<KernelKey> {
        KernelKey::enumerate(self.architecture, &self.scheduler_policy)
    }

    /// Resolves the kernel, its arguments and its launch geometry for
    /// `params`. Pure: no backend call is made.
    pub fn plan(
        &self,
        params: &ForwardParameters,
    ) -> Result<LaunchPlan, ConfigurationError> {
        let flags = VariantFlags::resolve(params)?;
        if params.batch_size <= 0 || params.num_heads <= 0 || params.max_q_len <= 0 {
            return Err(ConfigurationError::EmptyWorkload {
                batch_size: params.batch_size,
                num_heads: params.num_heads,
                max_q_len: params.max_q_len,
            });
        }
        let specialization = Specialization::select(self.architecture, params.qk_head_dim, &flags, params.data_type)?;
        let scheduler = self.scheduler_policy.select(flags.jagged, flags.mask, self.architecture.generation())?;
        if scheduler.uses_tile_count_semaphore() && params.tile_count_semaphore.is_none() {
            return Err(ConfigurationError::MissingTileCountSemaphore {
                scheduler: scheduler.name(),
            });
        }

        let cluster_m = specialization.cluster_m(&self.config, &flags, params.max_q_len);
        let key = KernelKey::new(&specialization, flags, scheduler, cluster_m);
        let kernel = FlashForwardKernel::new(specialization, scheduler, cluster_m);
        let arguments = KernelArguments::new(params, &specialization, &flags, cluster_m);
        let descriptor = DispatchDescriptor::new(&kernel, &arguments);

        let plan = LaunchPlan {
            key,
            entry_point: key.entry_point(),
            specialization,
            scheduler,
            params: descriptor.params,
            geometry: descriptor.geometry,
        };
        #[cfg(feature = "debug-info")]
        log::info!("resolved attention forward launch\n{plan}");
        Ok(plan)
    }

    /// Plans and enqueues one forward pass on `stream`. Returns once the
    /// kernel is enqueued; completion is the caller's to await.
    pub fn launch(
        &self,
        params: &ForwardParameters,
        stream: &B::Stream,
    ) -> Result<LaunchPlan, DispatchError<B::Error>> {
        let plan = self.plan(params)?;
        let function = self.function(params.device, &plan.key)?;
        self.invoker.invoke(&self.backend, params.device, &plan.key, &function, &plan.descriptor(), stream)?;
        Ok(plan)
    }

    fn function(
        &self,
        device: i32,
        key: &KernelKey,
    ) -> Result<B::Function, DispatchError<B::Error>> {
        let mut functions = self.functions.lock();
        if let Some(function) = functions.get(&(device, *key)) {
            return Ok(function.clone());
        }
        let entry_point = key.entry_point();
        let function = self.backend.load_function(device, &entry_point).map_err(|source| DispatchError::FunctionLoad {
            entry_point,
            source,
        })?;
        functions.insert((device, *key), function.clone());
        Ok(function)
    }
}
