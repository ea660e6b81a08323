use std::path::PathBuf;

use console::Style;
use hstu::{
    Architecture, DataType, DevicePointer, DispatchConfig, FlashAttentionForward, ForwardParameters, TensorView,
    ValueLayout, backends::trace::TraceBackend,
};

// Planning never dereferences device memory, so tensors get placeholder
// addresses in disjoint ranges.
const Q_ADDRESS: u64 = 0x1000_0000_0000;
const K_ADDRESS: u64 = 0x2000_0000_0000;
const V_ADDRESS: u64 = 0x3000_0000_0000;
const O_ADDRESS: u64 = 0x4000_0000_0000;
const LSE_ADDRESS: u64 = 0x5000_0000_0000;
const SEQ_OFFSETS_ADDRESS: u64 = 0x6000_0000_0000;
const SEQ_OFFSETS_Q_ADDRESS: u64 = 0x6100_0000_0000;
const NUM_TARGETS_ADDRESS: u64 = 0x7000_0000_0000;
const SEMAPHORE_ADDRESS: u64 = 0x8000_0000_0000;

/// One forward call described from the command line.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub architecture: Architecture,
    pub data_type: DataType,
    pub head_dim: i32,
    pub batch_size: i32,
    pub num_heads: i32,
    pub max_q_len: i32,
    pub max_kv_len: Option<i32>,
    pub jagged: bool,
    pub cross: bool,
    pub causal: bool,
    pub local: bool,
    pub contextual_mask: bool,
    pub targets: bool,
    pub v_colmajor: bool,
    pub softmax_heads: i32,
    pub training: bool,
    pub num_sm: i32,
    pub enable_cluster: bool,
    pub config: Option<PathBuf>,
    pub json: bool,
}

impl PlanRequest {
    fn dispatch_config(&self) -> Result<DispatchConfig, String> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|error| format!("failed to read {}: {error}", path.display()))?;
                serde_json::from_str(&contents)
                    .map_err(|error| format!("failed to parse {}: {error}", path.display()))?
            },
            None => DispatchConfig::from_env(),
        };
        config.enable_cluster |= self.enable_cluster;
        Ok(config)
    }

    fn forward_parameters(&self) -> ForwardParameters {
        let max_kv_len = self.max_kv_len.unwrap_or(self.max_q_len);
        let tensor = |address, max_len: i32| {
            let head_dim = self.head_dim as i64;
            let num_heads = self.num_heads as i64;
            TensorView {
                pointer: DevicePointer(address),
                row_stride: num_heads * head_dim,
                head_stride: head_dim,
                batch_stride: max_len as i64 * num_heads * head_dim,
            }
        };
        let value_layout = if self.v_colmajor {
            ValueLayout::ColumnMajor {
                dim_stride: (self.batch_size * max_kv_len) as i64,
            }
        } else {
            ValueLayout::RowMajor
        };

        ForwardParameters {
            data_type: self.data_type,
            query: tensor(Q_ADDRESS, self.max_q_len),
            key: tensor(K_ADDRESS, max_kv_len),
            value: tensor(V_ADDRESS, max_kv_len),
            value_layout,
            output: tensor(O_ADDRESS, self.max_q_len),
            softmax_lse: Some(DevicePointer(LSE_ADDRESS)),
            batch_size: self.batch_size,
            num_heads: self.num_heads,
            qk_head_dim: self.head_dim,
            v_head_dim: self.head_dim,
            max_q_len: self.max_q_len,
            max_kv_len,
            total_q_len: self.batch_size * self.max_q_len,
            total_kv_len: self.batch_size * max_kv_len,
            seq_offsets: self.jagged.then_some(DevicePointer(SEQ_OFFSETS_ADDRESS)),
            seq_offsets_q: self.cross.then_some(DevicePointer(SEQ_OFFSETS_Q_ADDRESS)),
            causal: self.causal,
            local: self.local,
            has_contextual_mask: self.contextual_mask,
            num_targets: self.targets.then_some(DevicePointer(NUM_TARGETS_ADDRESS)),
            num_softmax_heads: self.softmax_heads,
            training: self.training,
            num_sm: self.num_sm,
            tile_count_semaphore: Some(DevicePointer(SEMAPHORE_ADDRESS)),
            ..Default::default()
        }
    }
}

pub fn handle_plan(request: PlanRequest) -> Result<(), String> {
    let config = request.dispatch_config()?;
    let forward = FlashAttentionForward::new(TraceBackend::new(), request.architecture, config);
    let plan = forward.plan(&request.forward_parameters()).map_err(|error| error.to_string())?;

    if request.json {
        let json = serde_json::to_string_pretty(&plan).map_err(|error| error.to_string())?;
        println!("{json}");
    } else {
        let title = Style::new().bold();
        let heading = format!("{} {} head_dim={}", request.architecture, request.data_type, request.head_dim);
        println!("{}", title.apply_to(heading));
        println!("{plan}");
    }
    Ok(())
}
