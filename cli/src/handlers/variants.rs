use console::Style;
use hstu::{
    Architecture,
    backends::common::kernel::attention::{KernelKey, SchedulerPolicy},
};

/// Lists the entry points a kernel build for `architecture` has to provide.
pub fn handle_variants(
    architecture: Architecture,
    count_only: bool,
) {
    let keys = KernelKey::enumerate(architecture, &SchedulerPolicy::default());
    if count_only {
        println!("{}", keys.len());
        return;
    }
    for key in &keys {
        println!("{key}");
    }
    let summary = Style::new().dim();
    eprintln!("{}", summary.apply_to(format!("{} entry points for {architecture}", keys.len())));
}
