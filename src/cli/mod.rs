//! Command line interface for the fleshing harness.

mod args;
mod run;

pub use args::Cli;
