pub mod cli;
pub mod codeowners;
pub mod command;
pub mod config;
mod error;
pub mod forge;
pub mod maven;
pub mod meta;
pub mod publish;
pub mod repo;
pub mod scan;

pub use cli::{Args, Command};
pub use error::{Result, StewardError};

#[cfg(test)]
pub mod test_helpers;
