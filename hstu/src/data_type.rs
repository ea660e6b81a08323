use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    F16,
    BF16,
    F8E4M3,
    F8E5M2,
    F32,
}

impl DataType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::F16 | DataType::BF16 => 2,
            DataType::F8E4M3 | DataType::F8E5M2 => 1,
            DataType::F32 => 4,
        }
    }

    pub fn is_fp8(&self) -> bool {
        matches!(self, DataType::F8E4M3 | DataType::F8E5M2)
    }

    /// Element type the epilogue writes. 8-bit inputs are widened to bf16.
    pub fn kernel_output_type(&self) -> DataType {
        if self.is_fp8() {
            DataType::BF16
        } else {
            *self
        }
    }

    pub fn function_name_suffix(&self) -> &'static str {
        match self {
            DataType::F16 => "f16",
            DataType::BF16 => "bf16",
            DataType::F8E4M3 => "e4m3",
            DataType::F8E5M2 => "e5m2",
            DataType::F32 => "f32",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.function_name_suffix())
    }
}

impl FromStr for DataType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "f16" | "fp16" | "half" => Ok(DataType::F16),
            "bf16" | "bfloat16" => Ok(DataType::BF16),
            "e4m3" | "f8e4m3" | "fp8_e4m3" => Ok(DataType::F8E4M3),
            "e5m2" | "f8e5m2" | "fp8_e5m2" => Ok(DataType::F8E5M2),
            "f32" | "fp32" | "float" => Ok(DataType::F32),
            _ => Err(ParseError::DataType(s.to_string())),
        }
    }
}
