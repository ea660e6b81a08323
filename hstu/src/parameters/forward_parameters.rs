use serde::{Deserialize, Serialize};

use super::{Descale, DevicePointer, TensorView, ValueLayout};
use crate::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardParameters {
    pub data_type: DataType,

    pub query: TensorView,
    pub key: TensorView,
    pub value: TensorView,
    pub value_layout: ValueLayout,
    pub output: TensorView,
    pub softmax_lse: Option<DevicePointer>,

    pub q_descale: Option<Descale>,
    pub k_descale: Option<Descale>,
    pub v_descale: Option<Descale>,

    pub batch_size: i32,
    pub num_heads: i32,
    pub qk_head_dim: i32,
    pub v_head_dim: i32,
    pub max_q_len: i32,
    pub max_kv_len: i32,
    /// Flattened query length, used instead of `max_q_len` in jagged mode.
    pub total_q_len: i32,
    /// Flattened key/value length, used instead of `max_kv_len` in jagged mode.
    pub total_kv_len: i32,

    /// `batch_size + 1` boundaries into the flattened sequence axis. Present
    /// iff the batch is jagged.
    pub seq_offsets: Option<DevicePointer>,
    /// Query side boundaries. Present iff query and key/value lengths are
    /// tracked independently (cross attention).
    pub seq_offsets_q: Option<DevicePointer>,

    pub causal: bool,
    pub local: bool,
    pub max_attn_len: i32,
    pub min_full_attn_seq_len: i32,
    pub contextual_seq_len: i32,
    pub has_contextual_mask: bool,
    /// Per-batch count of trailing target positions.
    pub num_targets: Option<DevicePointer>,

    pub max_seq_len_tensor: Option<DevicePointer>,
    pub contextual_seq_len_tensor: Option<DevicePointer>,
    pub max_attn_len_tensor: Option<DevicePointer>,
    pub min_full_attn_seq_len_tensor: Option<DevicePointer>,
    pub attn_scale: Option<DevicePointer>,
    pub alpha: f32,
    pub scalar_scale: f32,

    pub training: bool,
    /// Heads `[0, num_softmax_heads)` are softmax normalized, the rest use
    /// the SiLU formulation.
    pub num_softmax_heads: i32,
    pub num_groups: i32,
    pub batch_size_per_group: i32,

    pub device: i32,
    pub num_sm: i32,
    /// Zeroed by the caller before every launch that uses a dynamic scheduler.
    pub tile_count_semaphore: Option<DevicePointer>,
}

impl ForwardParameters {
    pub fn is_jagged(&self) -> bool {
        self.seq_offsets.is_some()
    }

    pub fn is_cross(&self) -> bool {
        self.seq_offsets_q.is_some()
    }

    /// Offsets that delimit query tiles: query side under cross attention.
    pub fn query_offsets(&self) -> Option<DevicePointer> {
        if self.is_cross() {
            self.seq_offsets_q
        } else {
            self.seq_offsets
        }
    }
}

impl Default for ForwardParameters {
    fn default() -> Self {
        Self {
            data_type: DataType::BF16,
            query: TensorView::default(),
            key: TensorView::default(),
            value: TensorView::default(),
            value_layout: ValueLayout::RowMajor,
            output: TensorView::default(),
            softmax_lse: None,
            q_descale: None,
            k_descale: None,
            v_descale: None,
            batch_size: 1,
            num_heads: 1,
            qk_head_dim: 128,
            v_head_dim: 128,
            max_q_len: 0,
            max_kv_len: 0,
            total_q_len: 0,
            total_kv_len: 0,
            seq_offsets: None,
            seq_offsets_q: None,
            causal: false,
            local: false,
            max_attn_len: 0,
            min_full_attn_seq_len: 0,
            contextual_seq_len: 0,
            has_contextual_mask: false,
            num_targets: None,
            max_seq_len_tensor: None,
            contextual_seq_len_tensor: None,
            max_attn_len_tensor: None,
            min_full_attn_seq_len_tensor: None,
            attn_scale: None,
            alpha: 1.0,
            scalar_scale: 1.0,
            training: false,
            num_softmax_heads: 0,
            num_groups: 1,
            batch_size_per_group: 0,
            device: 0,
            num_sm: 132,
            tile_count_semaphore: None,
        }
    }
}
