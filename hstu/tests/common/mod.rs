#![allow(dead_code)]

use hstu::{
    Architecture, DataType, Descale, DevicePointer, DispatchConfig, FlashAttentionForward, ForwardParameters,
    TensorView, ValueLayout,
    backends::{
        common::kernel::attention::{MaskMode, VariantFlags},
        trace::TraceBackend,
    },
};

pub const Q_PTR: DevicePointer = DevicePointer(0x1000_0000);
pub const K_PTR: DevicePointer = DevicePointer(0x2000_0000);
pub const V_PTR: DevicePointer = DevicePointer(0x3000_0000);
pub const O_PTR: DevicePointer = DevicePointer(0x4000_0000);
pub const LSE_PTR: DevicePointer = DevicePointer(0x5000_0000);
pub const SEQ_OFFSETS: DevicePointer = DevicePointer(0x6000_0000);
pub const SEQ_OFFSETS_Q: DevicePointer = DevicePointer(0x6100_0000);
pub const NUM_TARGETS: DevicePointer = DevicePointer(0x7000_0000);
pub const SEMAPHORE: DevicePointer = DevicePointer(0x8000_0000);

pub fn dispatcher(architecture: Architecture) -> FlashAttentionForward<TraceBackend> {
    FlashAttentionForward::new(TraceBackend::new(), architecture, DispatchConfig::default())
}

pub fn cluster_dispatcher(architecture: Architecture) -> FlashAttentionForward<TraceBackend> {
    let config = DispatchConfig {
        enable_cluster: true,
    };
    FlashAttentionForward::new(TraceBackend::new(), architecture, config)
}

/// Contiguous `[batch, seq, head, dim]` tensor.
pub fn contiguous(
    pointer: DevicePointer,
    max_len: i32,
    num_heads: i32,
    head_dim: i32,
) -> TensorView {
    let head_dim = head_dim as i64;
    let num_heads = num_heads as i64;
    TensorView {
        pointer,
        row_stride: num_heads * head_dim,
        head_stride: head_dim,
        batch_stride: max_len as i64 * num_heads * head_dim,
    }
}

/// Padded batch of 2 sequences of up to 512 tokens, 8 heads.
pub fn dense_params(
    data_type: DataType,
    head_dim: i32,
) -> ForwardParameters {
    let batch_size = 2;
    let num_heads = 8;
    let max_len = 512;
    ForwardParameters {
        data_type,
        query: contiguous(Q_PTR, max_len, num_heads, head_dim),
        key: contiguous(K_PTR, max_len, num_heads, head_dim),
        value: contiguous(V_PTR, max_len, num_heads, head_dim),
        output: contiguous(O_PTR, max_len, num_heads, head_dim),
        softmax_lse: Some(LSE_PTR),
        batch_size,
        num_heads,
        qk_head_dim: head_dim,
        v_head_dim: head_dim,
        max_q_len: max_len,
        max_kv_len: max_len,
        total_q_len: batch_size * max_len,
        total_kv_len: batch_size * max_len,
        alpha: 0.125,
        num_sm: 132,
        tile_count_semaphore: Some(SEMAPHORE),
        ..Default::default()
    }
}

/// Jagged batch of 4 sequences flattened to 1000 tokens.
pub fn jagged_params(
    data_type: DataType,
    head_dim: i32,
) -> ForwardParameters {
    ForwardParameters {
        batch_size: 4,
        max_q_len: 400,
        max_kv_len: 400,
        total_q_len: 1000,
        total_kv_len: 1000,
        seq_offsets: Some(SEQ_OFFSETS),
        ..dense_params(data_type, head_dim)
    }
}

/// Parameters whose runtime flags resolve to exactly `flags`.
pub fn params_for(
    flags: &VariantFlags,
    data_type: DataType,
    head_dim: i32,
) -> ForwardParameters {
    let mut params = if flags.jagged {
        jagged_params(data_type, head_dim)
    } else {
        dense_params(data_type, head_dim)
    };
    params.causal = flags.mask == MaskMode::Causal;
    params.local = flags.mask == MaskMode::Local;
    params.has_contextual_mask = flags.contextual_mask;
    params.num_targets = flags.has_targets.then_some(NUM_TARGETS);
    params.seq_offsets_q = flags.cross.then_some(SEQ_OFFSETS_Q);
    params.num_softmax_heads = if flags.softmax {
        2
    } else {
        0
    };
    params.training = flags.training;
    if flags.v_colmajor {
        params.value_layout = ValueLayout::ColumnMajor {
            dim_stride: 512,
        };
    }
    params
}

pub fn with_descales(mut params: ForwardParameters) -> ForwardParameters {
    let descale = |address| Descale {
        pointer: DevicePointer(address),
        batch_stride: 8,
        head_stride: 1,
    };
    params.q_descale = Some(descale(0x9000_0000));
    params.k_descale = Some(descale(0x9100_0000));
    params.v_descale = Some(descale(0x9200_0000));
    params
}
