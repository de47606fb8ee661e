pub mod check;
pub mod commands;
pub mod listing;
pub mod progress;
pub mod render;
pub mod serve;
pub mod validate;

pub use commands::{Cli, Commands};
