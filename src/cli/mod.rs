//! Command-line interface module.

mod args;
pub mod common;
pub mod render;
pub mod stream;

pub use args::{Cli, Commands, OutputArgs, StreamArgs};
