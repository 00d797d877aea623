//! Environment variable helpers shared by the config loaders.

pub mod env;

pub use env::{get_env_csv, get_env_parsed, get_env_with_prefix};
