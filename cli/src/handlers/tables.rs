use console::Style;
use hstu::{
    Architecture, Generation,
    backends::common::kernel::attention::{
        DEFAULT_SCHEDULER_RULES, SM8X_TILE_TABLE, SM90_TILE_TABLE, SchedulerRule, Sm8xTileRule, Sm90TileRule,
    },
};
use serde::Serialize;

#[derive(Serialize)]
struct Tables {
    sm90: &'static [Sm90TileRule],
    sm8x: &'static [Sm8xTileRule],
    scheduler: &'static [SchedulerRule],
}

fn column<T: std::fmt::Debug>(value: Option<T>) -> String {
    value.map_or_else(|| "*".to_string(), |value| format!("{value:?}"))
}

/// Prints the tile tables of `architecture`, or of every tier when absent.
pub fn handle_tables(
    architecture: Option<Architecture>,
    json: bool,
) -> Result<(), String> {
    let generation = architecture.map(|architecture| architecture.generation());
    let sm90: &'static [Sm90TileRule] = match generation {
        Some(Generation::Sm8x) => &[],
        _ => SM90_TILE_TABLE,
    };
    let sm8x: &'static [Sm8xTileRule] = match generation {
        Some(Generation::Sm90) => &[],
        _ => SM8X_TILE_TABLE,
    };

    if json {
        let tables = Tables {
            sm90,
            sm8x,
            scheduler: DEFAULT_SCHEDULER_RULES,
        };
        let json = serde_json::to_string_pretty(&tables).map_err(|error| error.to_string())?;
        println!("{json}");
        return Ok(());
    }

    let header = Style::new().bold();
    if !sm90.is_empty() {
        println!("{}", header.apply_to("sm90 tiles (hdim elem mask vcol cross train -> block_m block_n mma1_rs)"));
    }
    for rule in sm90 {
        println!(
            "  {:>3} {} {:<13} {:<5} {:<5} {:<5} -> {:>3} {:>3} {}",
            rule.head_dim,
            rule.element_size,
            format!("{:?}", rule.mask),
            column(rule.v_colmajor),
            column(rule.cross),
            column(rule.training),
            rule.tile.block_m,
            rule.tile.block_n,
            rule.tile.mma1_is_rs,
        );
    }

    if !sm8x.is_empty() {
        println!();
        println!("{}", header.apply_to("sm8x tiles (hdim elem narrow mask -> block_m block_n warps stages q_in_regs)"));
    }
    for rule in sm8x {
        println!(
            "  {:>3} {} {:<5} {:<13} -> {:>3} {:>3} {} {} {}",
            rule.head_dim,
            rule.element_size,
            column(rule.narrow_core),
            format!("{:?}", rule.mask),
            rule.tile.block_m,
            rule.tile.block_n,
            rule.tile.num_warps,
            rule.tile.stages,
            rule.tile.q_in_regs,
        );
    }

    println!();
    println!("{}", header.apply_to("schedulers (jagged mask generation -> scheduler)"));
    for rule in DEFAULT_SCHEDULER_RULES {
        println!(
            "  {:<5} {:<13} {:<5} -> {}",
            column(rule.jagged),
            format!("{:?}", rule.mask),
            column(rule.generation),
            rule.scheduler,
        );
    }
    Ok(())
}
