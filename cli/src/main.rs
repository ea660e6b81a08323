use std::{path::PathBuf, process::ExitCode};

use clap::{Args, CommandFactory, Parser, Subcommand};
use cli::{
    handlers::{PlanRequest, handle_plan, handle_tables, handle_variants},
    logger::init_logger,
};
use hstu::{Architecture, DataType};

#[derive(Parser)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the kernel, arguments and launch geometry of one forward call
    Plan(PlanArgs),
    /// Print the tile and scheduler tables
    Tables {
        /// Only the tier of this architecture
        #[arg(long)]
        arch: Option<Architecture>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List every kernel entry point an architecture can dispatch to
    Variants {
        /// Target architecture, e.g. sm90
        #[arg(long, default_value = "sm90")]
        arch: Architecture,
        /// Print only the number of entry points
        #[arg(long)]
        count: bool,
    },
}

#[derive(Args)]
struct PlanArgs {
    /// Target architecture, e.g. sm90 or sm_86
    #[arg(long, default_value = "sm90")]
    arch: Architecture,
    /// Element type: f16, bf16, e4m3 or e5m2
    #[arg(long, default_value = "bf16")]
    dtype: DataType,
    #[arg(long, default_value_t = 128)]
    head_dim: i32,
    #[arg(long, default_value_t = 1)]
    batch_size: i32,
    #[arg(long, default_value_t = 8)]
    num_heads: i32,
    #[arg(long, default_value_t = 1024)]
    max_q_len: i32,
    /// Defaults to the query length
    #[arg(long)]
    max_kv_len: Option<i32>,
    /// Sequences are flattened and delimited by offsets
    #[arg(long)]
    jagged: bool,
    /// Queries have their own offsets
    #[arg(long)]
    cross: bool,
    #[arg(long)]
    causal: bool,
    #[arg(long)]
    local: bool,
    #[arg(long)]
    contextual_mask: bool,
    /// Trailing target positions per sequence
    #[arg(long)]
    targets: bool,
    /// Column-major V (8-bit only)
    #[arg(long)]
    v_colmajor: bool,
    /// Number of softmax normalized heads
    #[arg(long, default_value_t = 0)]
    softmax_heads: i32,
    #[arg(long)]
    training: bool,
    #[arg(long, default_value_t = 132)]
    num_sm: i32,
    /// Allow thread block clusters on sm90
    #[arg(long)]
    enable_cluster: bool,
    /// JSON dispatch config, read instead of the environment
    #[arg(long)]
    config: Option<PathBuf>,
    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

impl From<PlanArgs> for PlanRequest {
    fn from(args: PlanArgs) -> Self {
        Self {
            architecture: args.arch,
            data_type: args.dtype,
            head_dim: args.head_dim,
            batch_size: args.batch_size,
            num_heads: args.num_heads,
            max_q_len: args.max_q_len,
            max_kv_len: args.max_kv_len,
            jagged: args.jagged,
            cross: args.cross,
            causal: args.causal,
            local: args.local,
            contextual_mask: args.contextual_mask,
            targets: args.targets,
            v_colmajor: args.v_colmajor,
            softmax_heads: args.softmax_heads,
            training: args.training,
            num_sm: args.num_sm,
            enable_cluster: args.enable_cluster,
            config: args.config,
            json: args.json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Some(Commands::Plan(args)) => handle_plan(args.into()),
        Some(Commands::Tables {
            arch,
            json,
        }) => handle_tables(arch, json),
        Some(Commands::Variants {
            arch,
            count,
        }) => {
            handle_variants(arch, count);
            Ok(())
        },
        None => {
            let mut cmd = Cli::command();
            cmd.print_help().map_err(|error| error.to_string())
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{} {message}", console::style("error:").red().bold());
            ExitCode::FAILURE
        },
    }
}
