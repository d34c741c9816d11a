#![deny(clippy::all)]
#![warn(clippy::pedantic)]

//! Benchmark harness for polyres.
//!
//! Run benchmarks with: `cargo bench -p polyres-bench`
//!
//! This crate only holds criterion benchmarks.
