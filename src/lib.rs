//! # oraload
//!
//! Turns a spreadsheet or CSV file into everything needed to create and load
//! an Oracle table: DROP and CREATE TABLE scripts, a normalized extract, and
//! the scripts that run them (a batch driver plus a `PowerShell` companion
//! that builds the SQL*Loader control and parameter files).
//!
//! ## Quick Start
//!
//! ```no_run
//! use oraload::config::GeneratorConfig;
//! use oraload::flows;
//!
//! let mut config = GeneratorConfig::default();
//! config.input_path = "convenio_plano.xlsx".into();
//!
//! let report = flows::generate(&config)?;
//! println!("{} -> {} columns", report.schema.name, report.schema.columns.len());
//! # Ok::<(), oraload::error::OraloadError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`schema`]: identifier normalization, table naming and column
//!   classification
//! - [`extract`]: reading the input and writing the extract
//! - [`scripts`]: SQL, batch and `PowerShell` templates and the artifact writer
//! - [`flows`]: the `generate` and `inspect` runs
//! - [`config`], [`error`], [`logging`]: run settings, errors and log setup

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod extract;
pub mod flows;
pub mod logging;
pub mod schema;
pub mod scripts;
