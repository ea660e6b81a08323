use thiserror::Error;

use crate::{Architecture, DataType};

/// Invalid request. Raised while selecting a specialization, before any
/// argument is marshaled or any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("causal and local masking cannot be enabled at the same time")]
    CausalAndLocal,
    #[error("empty workload: batch {batch_size}, heads {num_heads}, max query length {max_q_len}")]
    EmptyWorkload {
        batch_size: i32,
        num_heads: i32,
        max_q_len: i32,
    },
    #[error("unsupported element type {0}: only 16-bit and 8-bit elements are supported")]
    UnsupportedDataType(DataType),
    #[error("unsupported compute capability {major}.{minor}")]
    UnsupportedArchitecture {
        major: u32,
        minor: u32,
    },
    #[error("no {architecture} kernel for head dimension {head_dim} with {element_size}-byte elements")]
    UnsupportedHeadDim {
        architecture: Architecture,
        head_dim: i32,
        element_size: usize,
    },
    #[error("column-major value tensors require 8-bit elements, got {0}")]
    UnsupportedValueLayout(DataType),
    #[error("scheduler policy has no rule for this configuration")]
    NoSchedulerRule,
    #[error("{scheduler} scheduler requires a tile count semaphore")]
    MissingTileCountSemaphore {
        scheduler: &'static str,
    },
}

/// Failure of a dispatch. Backend failures carry the entry point they hit.
#[derive(Debug, Error)]
pub enum DispatchError<E: std::error::Error + 'static> {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("failed to load kernel {entry_point}: {source}")]
    FunctionLoad {
        entry_point: String,
        #[source]
        source: E,
    },
    #[error("failed to raise dynamic shared memory of {entry_point} to {bytes} bytes: {source}")]
    SharedMemoryOptIn {
        entry_point: String,
        bytes: usize,
        #[source]
        source: E,
    },
    #[error("failed to launch {entry_point}: {source}")]
    Launch {
        entry_point: String,
        #[source]
        source: E,
    },
    #[error("failed to launch {entry_point} on cluster: {source}")]
    ClusterLaunch {
        entry_point: String,
        #[source]
        source: E,
    },
}

impl<E: std::error::Error + 'static> DispatchError<E> {
    /// The rejected configuration, if the call never reached the backend.
    pub fn configuration(&self) -> Option<&ConfigurationError> {
        match self {
            DispatchError::Configuration(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown data type: {0}")]
    DataType(String),
    #[error("unknown architecture: {0}")]
    Architecture(String),
}
