//! CLI module for callwave - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running campaigns,
//! applying provider events and inspecting campaign state.

pub mod commands;

pub use commands::Cli;
