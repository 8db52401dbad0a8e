// library crate for qtree
// the binary in main.rs is a thin wrapper over cli::run

pub mod builder;
pub mod cli;
pub mod config;
pub mod events;
pub mod history;
pub mod registry;
pub mod sort;
pub mod tree;
pub mod validate;
pub mod wire;
