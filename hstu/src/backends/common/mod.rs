mod backend;
pub mod gpu_types;
mod grid_size;
pub mod kernel;
mod launch_geometry;

pub use backend::Backend;
pub use grid_size::GridSize;
pub use launch_geometry::LaunchGeometry;
