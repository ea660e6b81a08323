pub mod architecture;
pub mod backends;
pub mod config;
pub mod data_type;
pub mod error;
pub mod parameters;

pub use architecture::{Architecture, Generation};
pub use backends::common::{
    Backend, GridSize,
    kernel::attention::{FlashAttentionForward, LaunchPlan},
};
pub use config::DispatchConfig;
pub use data_type::DataType;
pub use error::{ConfigurationError, DispatchError, ParseError};
pub use parameters::{DevicePointer, Descale, ForwardParameters, TensorView, ValueLayout};
