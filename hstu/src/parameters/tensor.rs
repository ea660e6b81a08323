use std::fmt;

use serde::{Deserialize, Serialize};

/// Address in device memory.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DevicePointer(pub u64);

impl DevicePointer {
    pub const NULL: DevicePointer = DevicePointer(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    pub fn address(&self) -> u64 {
        self.0
    }

    /// Address of an optional pointer, null when absent.
    pub fn address_of(pointer: Option<DevicePointer>) -> u64 {
        pointer.map_or(0, |pointer| pointer.0)
    }
}

impl fmt::Display for DevicePointer {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A `[batch, seq, head, dim]` tensor with a contiguous last dimension.
///
/// All strides are in elements. `batch_stride` is ignored in jagged mode,
/// where batch boundaries come from the sequence offsets instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TensorView {
    pub pointer: DevicePointer,
    pub row_stride: i64,
    pub head_stride: i64,
    pub batch_stride: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueLayout {
    #[default]
    RowMajor,
    /// Head dimension is strided, sequence is contiguous. 8-bit only.
    ColumnMajor {
        dim_stride: i64,
    },
}

/// Per-tensor dequantization scales for 8-bit inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Descale {
    pub pointer: DevicePointer,
    pub batch_stride: i64,
    pub head_stride: i64,
}
