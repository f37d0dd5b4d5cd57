#![doc = include_str!("../README.md")]

//! Fresca transition engine.
//!
//! This crate turns parsed pi-calculus programs into labelled transition
//! systems: register assignments, the double-transition relation,
//! structural-congruence normalisation, breadth-first exploration, and the
//! output renderers.

pub mod congruence;
pub mod explore;
pub mod names;
pub mod pipeline;
pub mod registers;
pub mod render;
pub mod transition;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest_generators;

pub use explore::{explore, ExploreOptions, Lts, LtsTransition, UNLIMITED_REGISTERS};
pub use pipeline::{generate_lts, generate_lts_file, PipelineError};
pub use transition::{Configuration, Label, Semantics, Symbol, SymbolKind};
