mod attention;

pub use attention::{EpilogueArguments, HardwareInfo, KernelParams, MainloopArguments, TileSchedulerArguments};
