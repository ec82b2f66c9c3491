//! Config Packager Library
//!
//! Compiles layered configuration: dependency trees and the local project
//! are merged, `${key}` placeholders are filled from the merged constants,
//! and the constants are exported as JSON.

pub mod build;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod context;
pub mod deps;
pub mod error;
pub mod logging;
pub mod watch;
