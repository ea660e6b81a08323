mod plan;
mod tables;
mod variants;

pub use plan::{PlanRequest, handle_plan};
pub use tables::handle_tables;
pub use variants::handle_variants;
