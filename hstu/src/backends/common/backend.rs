use std::error::Error;

use super::{LaunchGeometry, gpu_types::KernelParams};

/// Device driver surface the dispatcher launches through.
///
/// Implementations wrap a driver API. Every call is synchronous on the host;
/// launches are enqueued on `stream` and return without waiting.
pub trait Backend {
    type Stream;
    type Function: Clone;
    type Error: Error + 'static;

    /// Resolves the ahead-of-time compiled entry point named `entry_point`.
    fn load_function(
        &self,
        device: i32,
        entry_point: &str,
    ) -> Result<Self::Function, Self::Error>;

    /// Raises the dynamic shared memory ceiling of `function` to `bytes`.
    fn set_max_dynamic_shared_memory(
        &self,
        function: &Self::Function,
        bytes: usize,
    ) -> Result<(), Self::Error>;

    /// Plain launch. `geometry.cluster` is always 1x1x1 here.
    fn launch(
        &self,
        function: &Self::Function,
        geometry: &LaunchGeometry,
        params: &KernelParams,
        stream: &Self::Stream,
    ) -> Result<(), Self::Error>;

    /// Cooperative launch with blocks grouped into `geometry.cluster`.
    fn launch_on_cluster(
        &self,
        function: &Self::Function,
        geometry: &LaunchGeometry,
        params: &KernelParams,
        stream: &Self::Stream,
    ) -> Result<(), Self::Error>;
}
