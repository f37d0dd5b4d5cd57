//! End-to-end LTS generation: source text in, explored transition system out.

use std::fs;
use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;
use tracing::info;

use fresca_dsl::errors::ParseError;
use fresca_dsl::parse;

use crate::explore::{explore, ExploreOptions, Lts};
use crate::transition::Semantics;

#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parses `source` and explores its state space under `opts`. `filename` is
/// only used in diagnostics.
pub fn generate_lts(
    source: &str,
    filename: &str,
    opts: &ExploreOptions,
) -> Result<Lts, PipelineError> {
    let program = parse(source, filename)?;
    let mut sem = Semantics::new(program.declarations, opts.register_size);
    let root = sem.root_configuration(program.main);
    let lts = explore(&mut sem, root, opts);
    info!(
        file = filename,
        states = lts.states.len(),
        transitions = lts.transitions.len(),
        "generated transition system"
    );
    Ok(lts)
}

/// Reads a program from `path` and generates its LTS.
pub fn generate_lts_file(path: &Path, opts: &ExploreOptions) -> Result<Lts, PipelineError> {
    let source = fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    generate_lts(&source, &path.display().to_string(), opts)
}
