use super::{dispatch_descriptor::num_query_tiles, specialization::Specialization, variant_flags::VariantFlags};
use crate::{
    backends::common::gpu_types::{EpilogueArguments, HardwareInfo, MainloopArguments, TileSchedulerArguments},
    parameters::{Descale, DevicePointer, ForwardParameters, TensorView, ValueLayout},
};

/// The argument bundles of one launch, before the kernel folds them into its
/// parameter block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelArguments {
    pub mainloop: MainloopArguments,
    pub epilogue: EpilogueArguments,
    pub scheduler: TileSchedulerArguments,
    pub hardware: HardwareInfo,
}

impl KernelArguments {
    /// Copies addresses and scalars out of `params`. Never touches device
    /// memory, so shape or stride mismatches with the real buffers go
    /// undetected here.
    pub fn new(
        params: &ForwardParameters,
        specialization: &Specialization,
        flags: &VariantFlags,
        cluster_m: i32,
    ) -> Self {
        Self {
            mainloop: mainloop_arguments(params, specialization, flags),
            epilogue: epilogue_arguments(params, flags),
            scheduler: scheduler_arguments(params, specialization, cluster_m),
            hardware: HardwareInfo {
                device_id: params.device,
                sm_count: params.num_sm,
            },
        }
    }
}

struct SequenceExtent {
    seqlen_q: i32,
    seqlen_kv: i32,
    batch: i32,
}

impl SequenceExtent {
    fn new(
        params: &ForwardParameters,
        jagged: bool,
    ) -> Self {
        if jagged {
            Self {
                seqlen_q: params.total_q_len,
                seqlen_kv: params.total_kv_len,
                batch: 1,
            }
        } else {
            Self {
                seqlen_q: params.max_q_len,
                seqlen_kv: params.max_kv_len,
                batch: params.batch_size,
            }
        }
    }
}

/// Batch stride as the kernel sees it. Jagged batches are addressed through
/// the offsets, never through a stride.
fn batch_stride(
    tensor: &TensorView,
    jagged: bool,
) -> i64 {
    if jagged {
        0
    } else {
        tensor.batch_stride
    }
}

fn row_major_strides(
    tensor: &TensorView,
    jagged: bool,
) -> [i64; 4] {
    [tensor.row_stride, 1, tensor.head_stride, batch_stride(tensor, jagged)]
}

fn descale_parts(
    descale: Option<Descale>,
    fp8: bool,
) -> (u64, [i64; 2]) {
    match descale {
        Some(descale) if fp8 => (descale.pointer.address(), [descale.batch_stride, descale.head_stride]),
        _ => (0, [0, 0]),
    }
}

fn mainloop_arguments(
    params: &ForwardParameters,
    specialization: &Specialization,
    flags: &VariantFlags,
) -> MainloopArguments {
    let jagged = flags.jagged;
    let extent = SequenceExtent::new(params, jagged);
    let fp8 = specialization.element.is_fp8();

    let stride_v = match params.value_layout {
        ValueLayout::ColumnMajor {
            dim_stride,
        } if flags.v_colmajor => [1, dim_stride, params.value.head_stride, batch_stride(&params.value, jagged)],
        _ => row_major_strides(&params.value, jagged),
    };

    let (q_descale_ptr, stride_q_descale) = descale_parts(params.q_descale, fp8);
    let (k_descale_ptr, stride_k_descale) = descale_parts(params.k_descale, fp8);
    let (v_descale_ptr, stride_v_descale) = descale_parts(params.v_descale, fp8);

    MainloopArguments {
        q_ptr: params.query.pointer.address(),
        shape_q: [extent.seqlen_q, params.qk_head_dim, params.num_heads, extent.batch],
        stride_q: row_major_strides(&params.query, jagged),
        k_ptr: params.key.pointer.address(),
        shape_k: [extent.seqlen_kv, params.qk_head_dim, params.num_heads, extent.batch],
        stride_k: row_major_strides(&params.key, jagged),
        v_ptr: params.value.pointer.address(),
        stride_v,
        q_descale_ptr,
        k_descale_ptr,
        v_descale_ptr,
        stride_q_descale,
        stride_k_descale,
        stride_v_descale,
        softmax_scale: 1.0 / params.max_kv_len as f32,
        alpha: params.alpha,
        max_attn_len: params.max_attn_len,
        min_full_attn_seq_len: params.min_full_attn_seq_len,
        contextual_seq_len: params.contextual_seq_len,
        num_softmax_heads: params.num_softmax_heads,
        num_groups: params.num_groups,
        batch_size_per_group: params.batch_size_per_group,
        seq_offsets: DevicePointer::address_of(params.seq_offsets),
        seq_offsets_q: DevicePointer::address_of(params.seq_offsets_q),
        num_targets: DevicePointer::address_of(params.num_targets),
        max_seq_len_tensor: DevicePointer::address_of(params.max_seq_len_tensor),
        contextual_seq_len_tensor: DevicePointer::address_of(params.contextual_seq_len_tensor),
        max_attn_len_tensor: DevicePointer::address_of(params.max_attn_len_tensor),
        min_full_attn_seq_len_tensor: DevicePointer::address_of(params.min_full_attn_seq_len_tensor),
        attn_scale: DevicePointer::address_of(params.attn_scale),
        scalar_scale: params.scalar_scale,
    }
}

fn epilogue_arguments(
    params: &ForwardParameters,
    flags: &VariantFlags,
) -> EpilogueArguments {
    let jagged = flags.jagged;
    let extent = SequenceExtent::new(params, jagged);
    let lse_batch_stride = if jagged {
        0
    } else {
        params.num_heads as i64 * extent.seqlen_q as i64
    };

    EpilogueArguments {
        o_ptr: params.output.pointer.address(),
        shape_o: [extent.seqlen_q, params.v_head_dim, params.num_heads, extent.batch, 1],
        stride_o: [params.output.row_stride, 1, params.output.head_stride, batch_stride(&params.output, jagged), 0],
        num_heads: params.num_heads,
        num_softmax_heads: params.num_softmax_heads,
        stride_lse: [1, extent.seqlen_q as i64, lse_batch_stride, 0],
        lse_ptr: DevicePointer::address_of(params.softmax_lse),
        seq_offsets: DevicePointer::address_of(params.query_offsets()),
    }
}

fn scheduler_arguments(
    params: &ForwardParameters,
    specialization: &Specialization,
    cluster_m: i32,
) -> TileSchedulerArguments {
    TileSchedulerArguments {
        num_blocks_m: num_query_tiles(params.max_q_len, specialization.block_m, cluster_m),
        num_heads: params.num_heads,
        num_batch: params.batch_size,
        max_q_len: params.max_q_len,
        head_dim: params.qk_head_dim,
        element_size: specialization.element.size_in_bytes() as i32,
        tile_count_semaphore: DevicePointer::address_of(params.tile_count_semaphore),
        seq_offsets: DevicePointer::address_of(params.query_offsets()),
    }
}
