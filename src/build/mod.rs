//! Building the compiled configuration tree.
//!
//! [`compile`] drives the whole pipeline: dependency resolution, the layered
//! merge with placeholder substitution, and the JSON export.

mod copy;
mod export;
mod merger;
mod pipeline;
mod substitute;

pub use copy::{ResourceFilter, copy_tree};
pub use export::{export, render_json};
pub use merger::{ConfigMerger, ConfigTree, DEPENDENCY_CONSTANTS_CANDIDATES};
pub use pipeline::{CompileReport, compile, export_constants, generate_filters};
pub use substitute::substitute;
