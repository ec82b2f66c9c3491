//! Configuration types and structures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level packager configuration.
///
/// Every section and field has a default so a project needs no
/// configuration file at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackagerConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub deploy: DeployConfig,

    #[serde(default)]
    pub package: PackageConfig,

    #[serde(default)]
    pub generate: GenerateConfig,
}

/// Project layout. Relative paths resolve against the project directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Local configuration tree.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Local constants source (YAML, JSON or properties).
    #[serde(default = "default_constants_file")]
    pub constants_file: PathBuf,

    /// Dependency declaration document.
    #[serde(default = "default_dependencies_file")]
    pub dependencies_file: PathBuf,

    /// Build directory; never watched.
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Subdirectory of the build directory holding all packager output.
    #[serde(default = "default_output_subdir")]
    pub output_subdir: String,

    /// Local artifact repository (default: `~/.m2/repository`).
    #[serde(default)]
    pub local_repository: Option<PathBuf>,

    /// Clear the compiled configuration before each compile.
    #[serde(default = "default_true")]
    pub clean_output: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            constants_file: default_constants_file(),
            dependencies_file: default_dependencies_file(),
            build_dir: default_build_dir(),
            output_subdir: default_output_subdir(),
            local_repository: None,
            clean_output: true,
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("configuration")
}

fn default_constants_file() -> PathBuf {
    PathBuf::from("constants.yml")
}

fn default_dependencies_file() -> PathBuf {
    PathBuf::from("dependencies.yml")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("target")
}

fn default_output_subdir() -> String {
    "packager-config".to_string()
}

/// Placeholder filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Extensions copied byte-for-byte, never substituted.
    #[serde(default = "default_non_filtered_extensions")]
    pub non_filtered_extensions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            non_filtered_extensions: default_non_filtered_extensions(),
        }
    }
}

fn default_non_filtered_extensions() -> Vec<String> {
    vec!["zip".to_string(), "xls".to_string(), "xlsx".to_string()]
}

/// Structured constants export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Subdirectory of the compiled configuration receiving the export.
    #[serde(default = "default_export_subdir")]
    pub subdir: String,

    #[serde(default = "default_export_file_name")]
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subdir: default_export_subdir(),
            file_name: default_export_file_name(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_export_subdir() -> String {
    "jsonkeyvalues".to_string()
}

fn default_export_file_name() -> String {
    "constants.json".to_string()
}

/// Change watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period after the last change before rebuilding.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Command run on each rebuild.
    #[serde(default = "default_watch_command")]
    pub command: String,

    /// Also watch each dependency's directory in the local repository.
    #[serde(default = "default_true")]
    pub watch_dependencies: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            command: default_watch_command(),
            watch_dependencies: true,
        }
    }
}

fn default_debounce_ms() -> u64 {
    5000
}

fn default_watch_command() -> String {
    "compile".to_string()
}

/// Copying compiled configuration into a local server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Server to deploy into after `compile`; unset disables deployment.
    #[serde(default)]
    pub server_id: Option<String>,

    /// Directory containing one directory per server (default: `~/openmrs`).
    #[serde(default)]
    pub servers_dir: Option<PathBuf>,
}

/// Content package descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Package name (default: the project directory name).
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    /// Subdirectory of the build directory receiving `content.properties`.
    #[serde(default = "default_package_subdir")]
    pub target_subdir: String,

    /// Subdirectory of the source tree packaged as frontend configuration.
    #[serde(default = "default_frontend_subdir")]
    pub frontend_subdir: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            name: None,
            version: None,
            target_subdir: default_package_subdir(),
            frontend_subdir: default_frontend_subdir(),
        }
    }
}

fn default_package_subdir() -> String {
    "package".to_string()
}

fn default_frontend_subdir() -> String {
    "frontend".to_string()
}

/// Generated constants source module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// File stem of the generated module.
    #[serde(default = "default_module_name")]
    pub module_name: String,

    /// Subdirectory of the build directory receiving the module.
    #[serde(default = "default_generated_subdir")]
    pub output_subdir: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            module_name: default_module_name(),
            output_subdir: default_generated_subdir(),
        }
    }
}

fn default_module_name() -> String {
    "constants".to_string()
}

fn default_generated_subdir() -> String {
    "generated-sources".to_string()
}
