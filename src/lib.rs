//! Fit Faker
//!
//! Rewrites FIT activity files from virtual trainer apps (Zwift,
//! TrainingPeaks Virtual, MyWhoosh, ...) so they carry the identity of a
//! real head unit, while every sample, lap, and session rides through
//! untouched.
//!
//! This crate provides the core implementation for the `fit-faker` CLI tool.
//!
//! ## Getting Started
//!
//! Most users should install and use the CLI:
//!
//! ```bash
//! cargo install fit-faker
//! fit-faker --help
//! ```

pub mod builder;
pub mod codec;
pub mod commands;
pub mod editor;
pub mod output;
pub mod profile;
pub mod utils;
