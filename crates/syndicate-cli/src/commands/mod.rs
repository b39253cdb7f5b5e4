// crates/syndicate-cli/src/commands/mod.rs
//
// Subcommand implementations for the Syndicate CLI.

pub mod deploy;
pub mod schedule;
pub mod simulate;
