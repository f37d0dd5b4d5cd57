//! CLI argument definitions for the `fresca` binary.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fresca")]
#[command(about = "Generates labelled transition systems for pi-calculus programs")]
#[command(version)]
pub(crate) struct Cli {
    /// Pi-calculus program file
    pub(crate) files: Vec<PathBuf>,

    /// Maximum number of states explored
    #[arg(short = 'n', long = "max-states", default_value_t = 20, allow_negative_numbers = true)]
    pub(crate) max_states: i64,

    /// Maximum number of registers (0 defaults to unlimited)
    #[arg(short = 'r', long = "max-registers", default_value_t = 0, allow_negative_numbers = true)]
    pub(crate) max_registers: i64,

    /// Disable register garbage collection
    #[arg(short = 'd', long = "disable-gc")]
    pub(crate) disable_gc: bool,

    /// Evaluate one program per line read from standard input
    #[arg(short = 'i', long = "interactive")]
    pub(crate) interactive: bool,

    /// Write the LTS to a file instead of standard output
    #[arg(short = 'o', long = "output")]
    pub(crate) output: Option<PathBuf>,

    /// Write the output file as GraphViz DOT with dot2tex LaTeX labels
    #[arg(short = 't', long = "output-tex")]
    pub(crate) output_tex: bool,

    /// Write the output file as a plain text listing
    #[arg(short = 'p', long = "output-pretty")]
    pub(crate) output_pretty: bool,

    /// Label GraphViz nodes with state identifiers instead of configurations
    #[arg(short = 's', long = "output-states")]
    pub(crate) output_states: bool,

    /// GraphViz layout attribute inserted into the graph, e.g. "rankdir=LR;"
    #[arg(short = 'l', long = "output-layout", default_value = "")]
    pub(crate) output_layout: String,

    /// Suppress the LTS listing on standard output
    #[arg(short = 'q', long = "quiet")]
    pub(crate) quiet: bool,

    /// Print exploration statistics
    #[arg(short = 'v', long = "stats")]
    pub(crate) stats: bool,
}
