//! Upstream configuration dependencies.
//!
//! A project declares its dependencies in `dependencies.yml` as an ordered
//! list of `groupId`/`artifactId`/`version` records. Order matters: later
//! dependencies override earlier ones during the merge.

mod fetch;
mod resolver;

pub use fetch::{ArtifactFetcher, LocalRepository, extract_zip};
pub use resolver::{DependencyResolver, ResolvedDependency};

use crate::error::{IoResultExt, PackagerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Coordinates of one upstream configuration artifact.
///
/// Immutable once constructed; equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    #[serde(rename = "groupId", alias = "group")]
    group: String,
    #[serde(rename = "artifactId", alias = "artifact")]
    artifact: String,
    version: String,
}

impl DependencyDescriptor {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Join the three coordinates with `separator`.
    pub fn to_string_with(&self, separator: &str) -> String {
        format!(
            "{}{separator}{}{separator}{}",
            self.group, self.artifact, self.version
        )
    }

    /// Collision-free staging directory name, e.g. `org.example_base_1.0.0`.
    pub fn staging_name(&self) -> String {
        self.to_string_with("_")
    }

    /// Directory holding this artifact in a repository laid out as
    /// `<root>/<group as path>/<artifact>/<version>`.
    pub fn repository_dir(&self, root: &Path) -> PathBuf {
        let mut dir = root.to_path_buf();
        for segment in self.group.split('.') {
            dir.push(segment);
        }
        dir.join(&self.artifact).join(&self.version)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for (field, value) in [
            ("groupId", &self.group),
            ("artifactId", &self.artifact),
            ("version", &self.version),
        ] {
            if value.trim().is_empty() {
                return Err(format!("dependency {self} has an empty {field}"));
            }
            if value.contains(['/', '\\']) || value == "." || value == ".." {
                return Err(format!("dependency {self} has an invalid {field} {value:?}"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for DependencyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with(":"))
    }
}

/// Parse a dependency declaration document.
pub fn parse_dependency_list(path: &Path, content: &str) -> Result<Vec<DependencyDescriptor>> {
    let descriptors: Option<Vec<DependencyDescriptor>> =
        serde_yaml::from_str(content).map_err(|e| PackagerError::parse(path, e))?;
    let descriptors = descriptors.unwrap_or_default();
    for descriptor in &descriptors {
        descriptor
            .validate()
            .map_err(|message| PackagerError::parse(path, message))?;
    }
    Ok(descriptors)
}

/// Load the dependency declaration file.
///
/// A missing file declares no dependencies.
pub fn load_dependency_list(path: &Path) -> Result<Vec<DependencyDescriptor>> {
    if !path.is_file() {
        info!("No dependency configuration file found at {}", path.display());
        return Ok(Vec::new());
    }
    info!("Dependency configuration file found at: {}", path.display());
    let content = std::fs::read_to_string(path).at_path(path)?;
    parse_dependency_list(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_display_and_staging_name() {
        let d = DependencyDescriptor::new("org.example", "base-config", "1.0.0");
        assert_eq!(d.to_string(), "org.example:base-config:1.0.0");
        assert_eq!(d.staging_name(), "org.example_base-config_1.0.0");
    }

    #[test]
    fn test_repository_dir() {
        let d = DependencyDescriptor::new("org.example.config", "base", "2.1");
        assert_eq!(
            d.repository_dir(Path::new("/repo")),
            PathBuf::from("/repo/org/example/config/base/2.1")
        );
    }

    #[test]
    fn test_structural_equality() {
        let a = DependencyDescriptor::new("g", "a", "1");
        let b = DependencyDescriptor::new("g", "a", "1");
        let c = DependencyDescriptor::new("g", "a", "2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_parse_preserves_declared_order() {
        let yaml = r#"
- groupId: org.zeta
  artifactId: zeta-config
  version: "1.0"
- groupId: org.alpha
  artifactId: alpha-config
  version: "2.0"
"#;
        let list = parse_dependency_list(Path::new("dependencies.yml"), yaml).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].artifact(), "zeta-config");
        assert_eq!(list[1].artifact(), "alpha-config");
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let yaml = "- groupId: org.example\n  artifactId: base\n";
        let err = parse_dependency_list(Path::new("dependencies.yml"), yaml).unwrap_err();
        assert!(matches!(err, PackagerError::Parse { .. }));
    }

    #[test]
    fn test_parse_rejects_empty_field() {
        let yaml = "- groupId: org.example\n  artifactId: \"\"\n  version: \"1\"\n";
        let err = parse_dependency_list(Path::new("dependencies.yml"), yaml).unwrap_err();
        assert!(err.to_string().contains("artifactId"));
    }

    #[test]
    fn test_parse_rejects_path_like_coordinates() {
        for (field, yaml) in [
            ("version", "- {groupId: g, artifactId: a, version: '../../../configuration'}\n"),
            ("artifactId", "- {groupId: g, artifactId: 'x\\y', version: '1'}\n"),
            ("groupId", "- {groupId: '..', artifactId: a, version: '1'}\n"),
        ] {
            let err = parse_dependency_list(Path::new("dependencies.yml"), yaml).unwrap_err();
            match err {
                PackagerError::Parse { path, message } => {
                    assert_eq!(path, Path::new("dependencies.yml"));
                    assert!(message.contains(field), "{message}");
                }
                other => panic!("expected a parse error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_document_declares_nothing() {
        let list = parse_dependency_list(Path::new("dependencies.yml"), "").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_missing_file_declares_nothing() {
        let temp = TempDir::new().unwrap();
        let list = load_dependency_list(&temp.path().join("dependencies.yml")).unwrap();
        assert!(list.is_empty());
    }
}
