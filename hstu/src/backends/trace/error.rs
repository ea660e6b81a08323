use thiserror::Error;

use super::TraceFailure;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    #[error("entry point not found: {0}")]
    FunctionNotFound(String),
    #[error("injected {0:?} failure")]
    Injected(TraceFailure),
}
