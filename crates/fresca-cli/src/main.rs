#![doc = include_str!("../README.md")]

mod cli;

use std::fs;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use clap::Parser;
use miette::{bail, Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use fresca_engine::{render, ExploreOptions, Lts, UNLIMITED_REGISTERS};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = explore_options(&cli)?;
    tracing::debug!(?opts, "exploration options");

    if cli.interactive {
        return run_interactive(&opts);
    }

    if cli.files.len() > 1 {
        bail!("more than one argument encountered");
    }
    let Some(file) = cli.files.first() else {
        bail!("input file required for LTS generation");
    };

    let io_start = Instant::now();
    let source = fs::read_to_string(file)
        .into_diagnostic()
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut io_time = io_start.elapsed();

    let gen_start = Instant::now();
    let lts = fresca_engine::generate_lts(&source, &file.display().to_string(), &opts)?;
    let gen_time = gen_start.elapsed();

    let io_start = Instant::now();
    let mut printed = false;
    match &cli.output {
        None => {
            if !cli.quiet {
                println!("{}", render::pretty_lts(&lts));
                printed = true;
            }
        }
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .into_diagnostic()
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
            }
            fs::write(path, rendered_output(&cli, &lts))
                .into_diagnostic()
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }
    io_time += io_start.elapsed();

    if cli.stats {
        print_stats(&lts, io_time, gen_time, printed && !cli.quiet);
    }

    Ok(())
}

/// Validates the exploration bounds and maps the 0 sentinel for
/// `--max-registers` onto the unlimited register size.
fn explore_options(cli: &Cli) -> Result<ExploreOptions> {
    if cli.max_states < 0 {
        bail!("maximum states explored must be positive");
    }
    if cli.max_registers < 0 {
        bail!("register size must be positive. 0 defaults to unlimited.");
    }
    let register_size = if cli.max_registers == 0 {
        UNLIMITED_REGISTERS
    } else {
        cli.max_registers as usize
    };
    Ok(ExploreOptions {
        max_states: cli.max_states as usize,
        register_size,
        disable_gc: cli.disable_gc,
    })
}

/// Picks the file output format. Pretty and TeX are explicit opt-ins, DOT is
/// the default for `--output`.
fn rendered_output(cli: &Cli, lts: &Lts) -> String {
    if cli.output_pretty {
        let mut listing = render::pretty_lts(lts);
        listing.push('\n');
        listing
    } else if cli.output_tex {
        render::graphviz_tex(lts, cli.output_states, &cli.output_layout)
    } else {
        render::graphviz(lts, cli.output_states, &cli.output_layout)
    }
}

fn print_stats(lts: &Lts, io_time: Duration, gen_time: Duration, listed: bool) {
    if listed {
        println!();
    }
    println!("states explored      {}", lts.states_explored);
    println!("states generated     {}", lts.states_generated);
    println!("states unique        {}", lts.states.len());
    println!("transitions          {}", lts.transitions.len());
    println!("time I/O             {:?}", io_time);
    println!("time LTS generation  {:?}", gen_time);
}

/// Reads one program per line from standard input and prints its LTS, until
/// end of input. Errors from a line are reported and the loop continues.
fn run_interactive(opts: &ExploreOptions) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("> ");
        stdout.flush().into_diagnostic()?;
        line.clear();
        if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
            return Ok(());
        }
        let source = line.trim();
        if source.is_empty() {
            continue;
        }
        match fresca_engine::generate_lts(source, "<interactive>", opts) {
            Ok(lts) => println!("{}", render::pretty_lts(&lts)),
            Err(err) => println!("error: {err}"),
        }
    }
}
