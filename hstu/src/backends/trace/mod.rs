//! Backend that records launches instead of executing them.
//!
//! Used to inspect what a dispatch would do on hardware that is not present:
//! the planning CLI and the test suite run on it.

mod backend;
mod error;

pub use backend::{TraceBackend, TraceEvent, TraceFailure, TraceFunction, TraceStream};
pub use error::TraceError;
