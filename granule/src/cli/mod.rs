//! Command-line interface for granule
//!
//! This module contains CLI argument parsing and configuration

pub mod args;
pub mod config;

pub use args::{Args, Command, InvalidAction, SelectArgs};
pub use config::Config;
