//! CLI command implementations.
//!
//! Each submodule implements a specific CLI subcommand.

pub mod plan;
