//! spritemerge CLI - merge a directory of images into one strip atlas
//!
//! This binary provides the `merge` and `validate` commands.

use clap::{ArgAction, Parser, Subcommand};
use spritemerge_spec::{Alignment, Axis, CompressionPreset, FloorPolicy};
use std::process::ExitCode;

use spritemerge_cli::commands;
use spritemerge_cli::commands::merge::MergeOptions;
use spritemerge_cli::logging;
use spritemerge_cli::settings::Overrides;

/// spritemerge - Strip Atlas Compositor
#[derive(Parser)]
#[command(name = "spritemerge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge every image in a directory into one atlas PNG
    Merge {
        /// Directory containing the source images
        input_dir: String,

        /// Concatenation axis (horizontal, vertical)
        #[arg(long)]
        axis: Option<Axis>,

        /// Vertical placement inside each cell (center, start, end or 0, 1, 2)
        #[arg(long)]
        align: Option<Alignment>,

        /// Minimum cell width in pixels
        #[arg(long)]
        min_width: Option<u32>,

        /// Minimum cell height in pixels
        #[arg(long)]
        min_height: Option<u32>,

        /// Cell floor policy (per_call, accumulate)
        #[arg(long)]
        floor_policy: Option<FloorPolicy>,

        /// Output directory (default: <data-dir>/spritemerge/png/merge)
        #[arg(short, long)]
        out_dir: Option<String>,

        /// Path to a merge config file (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Collect images from subdirectories too
        #[arg(short, long)]
        recursive: bool,

        /// File extension to collect (repeatable, default: png)
        #[arg(short, long = "extension")]
        extensions: Vec<String>,

        /// Also write a <millis>.json placement sidecar
        #[arg(long)]
        metadata: bool,

        /// PNG compression preset (fast, default, best)
        #[arg(long)]
        compression: Option<CompressionPreset>,

        /// Compose and encode without writing anything to disk
        #[arg(long)]
        dry_run: bool,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Validate a merge config file
    Validate {
        /// Path to the merge config file (JSON)
        #[arg(short, long)]
        config: String,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Merge {
            input_dir,
            axis,
            align,
            min_width,
            min_height,
            floor_policy,
            out_dir,
            config,
            recursive,
            extensions,
            metadata,
            compression,
            dry_run,
            json,
        } => commands::merge::run(&MergeOptions {
            input_dir,
            config_path: config,
            overrides: Overrides {
                axis,
                alignment: align,
                min_width,
                min_height,
                floor_policy,
                out_dir,
                metadata,
                compression,
            },
            recursive,
            extensions,
            dry_run,
            json,
        }),
        Commands::Validate { config, json } => commands::validate::run(&config, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
