//! Specialization and dispatch of the fused jagged attention forward kernel.
//!
//! A call flows through these stages:
//! 1. [`VariantFlags::resolve`] turns runtime flags into kernel axes,
//! 2. [`Specialization::select`] and [`SchedulerPolicy::select`] pick the
//!    tile shape and tile scheduler from their tables,
//! 3. [`KernelArguments::new`] marshals the argument bundles,
//! 4. [`DispatchDescriptor::new`] sizes the launch,
//! 5. [`KernelInvoker::invoke`] configures shared memory and launches.
//!
//! [`FlashAttentionForward`] runs the whole chain.

mod arguments;
mod dispatch_descriptor;
mod forward;
mod invoker;
mod kernel;
mod kernel_key;
mod scheduler;
mod shared_memory;
mod specialization;
mod tile_table;
mod variant_flags;

pub use arguments::KernelArguments;
pub use dispatch_descriptor::{DispatchDescriptor, num_query_tiles};
pub use forward::{FlashAttentionForward, LaunchPlan};
pub use invoker::{KernelInvoker, LaunchPath};
pub use kernel::{AttentionKernel, FlashForwardKernel};
pub use kernel_key::{KERNEL_DATA_TYPES, KernelKey};
pub use scheduler::{DEFAULT_SCHEDULER_RULES, SchedulerPolicy, SchedulerRule, SchedulerVariant};
pub use shared_memory::SharedMemoryOptIns;
pub use specialization::{Specialization, ceil_div, cluster_eligible, round_up};
pub use tile_table::{
    SM8X_TILE_TABLE, SM90_TILE_TABLE, Sm8xTile, Sm8xTileRule, Sm90Tile, Sm90TileRule, lookup_sm8x, lookup_sm90,
    supported_head_dims,
};
pub use variant_flags::{MaskMode, MaskPattern, VariantFlags};
