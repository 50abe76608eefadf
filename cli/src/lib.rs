//! proforma-cli: command-line front end for the proforma scenario engine.
//!
//! Reads baseline figures, allocation rules and default scenario settings
//! from a TOML file, applies flag overrides, and prints statements,
//! sensitivity grids, waterfall bridges or interest-rate ladders as tables
//! or JSON.

pub mod commands;
pub mod config;
pub mod error;
pub mod input;
