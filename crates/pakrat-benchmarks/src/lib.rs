//! Pakrat benchmarking suite
//!
//! Benchmarks version ordering, metadata parsing, repository reconciliation
//! and dependency resolution.

pub mod common;

pub use common::*;
