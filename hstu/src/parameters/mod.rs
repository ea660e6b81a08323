//! Runtime description of one attention forward call.
//!
//! The upstream operator binding fills a [`ForwardParameters`] after it has
//! validated shapes and allocated device buffers. Nothing here is ever
//! dereferenced on the host: pointers are copied into kernel arguments as
//! plain addresses.

mod forward_parameters;
mod tensor;

pub use forward_parameters::ForwardParameters;
pub use tensor::{Descale, DevicePointer, TensorView, ValueLayout};
