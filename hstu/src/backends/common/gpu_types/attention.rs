//! Attention kernel parameter structs.
//!
//! Layouts mirror the argument structs of the compiled kernels. Device
//! pointers are raw addresses, `0` meaning absent.

use serde::{Deserialize, Serialize};

/// Arguments of the producer/consumer mainloop.
///
/// All strides are in **elements**, not bytes.
/// Q/K/V are treated as 4D tensors with axes:
/// - `[0]` sequence (total length in jagged mode)
/// - `[1]` head dimension, stride 1 unless V is column-major
/// - `[2]` head
/// - `[3]` batch, stride 0 in jagged mode
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainloopArguments {
    pub q_ptr: u64,
    pub shape_q: [i32; 4],
    pub stride_q: [i64; 4],
    pub k_ptr: u64,
    pub shape_k: [i32; 4],
    pub stride_k: [i64; 4],
    pub v_ptr: u64,
    pub stride_v: [i64; 4],
    pub q_descale_ptr: u64,
    pub k_descale_ptr: u64,
    pub v_descale_ptr: u64,
    /// Descale strides are `(batch, head)`.
    pub stride_q_descale: [i64; 2],
    pub stride_k_descale: [i64; 2],
    pub stride_v_descale: [i64; 2],
    /// Reciprocal of the maximum key/value length.
    pub softmax_scale: f32,
    pub alpha: f32,
    pub max_attn_len: i32,
    pub min_full_attn_seq_len: i32,
    pub contextual_seq_len: i32,
    pub num_softmax_heads: i32,
    pub num_groups: i32,
    pub batch_size_per_group: i32,
    pub seq_offsets: u64,
    pub seq_offsets_q: u64,
    pub num_targets: u64,
    pub max_seq_len_tensor: u64,
    pub contextual_seq_len_tensor: u64,
    pub max_attn_len_tensor: u64,
    pub min_full_attn_seq_len_tensor: u64,
    pub attn_scale: u64,
    pub scalar_scale: f32,
}

/// Arguments of the output epilogue.
///
/// O has a trailing unit split axis: `(seq, dim, head, batch, split)`.
/// LSE strides are `(seq, head, batch, split)`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpilogueArguments {
    pub o_ptr: u64,
    pub shape_o: [i32; 5],
    pub stride_o: [i64; 5],
    pub num_heads: i32,
    pub num_softmax_heads: i32,
    pub stride_lse: [i64; 4],
    pub lse_ptr: u64,
    pub seq_offsets: u64,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSchedulerArguments {
    /// Query tiles per (head, batch), rounded up to the cluster size.
    pub num_blocks_m: i32,
    pub num_heads: i32,
    pub num_batch: i32,
    pub max_q_len: i32,
    pub head_dim: i32,
    pub element_size: i32,
    pub tile_count_semaphore: u64,
    pub seq_offsets: u64,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub device_id: i32,
    pub sm_count: i32,
}

/// Everything a kernel launch receives, in the kernel's own layout.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelParams {
    pub mainloop: MainloopArguments,
    pub epilogue: EpilogueArguments,
    pub scheduler: TileSchedulerArguments,
    pub hardware: HardwareInfo,
    /// `(block_m, block_n, head_dim)`
    pub tile_shape: [i32; 3],
    pub cluster_shape: [i32; 3],
    pub num_mma_threads: i32,
    pub num_producer_threads: i32,
}
