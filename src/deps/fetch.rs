//! Artifact fetching and extraction.

use super::DependencyDescriptor;
use crate::error::{IoResultExt, PackagerError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Supplies the unpacked contents of a dependency artifact.
pub trait ArtifactFetcher {
    /// Write the contents of `descriptor`'s artifact into `dest`.
    ///
    /// `dest` exists and is empty when this is called.
    fn fetch(&self, descriptor: &DependencyDescriptor, dest: &Path) -> Result<()>;

    /// Directory whose changes should trigger a rebuild, if any.
    fn watch_path(&self, _descriptor: &DependencyDescriptor) -> Option<PathBuf> {
        None
    }
}

/// Fetches zip artifacts from a local repository laid out as
/// `<root>/<group as path>/<artifact>/<version>/<artifact>-<version>.zip`.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every file of `descriptor`.
    pub fn artifact_dir(&self, descriptor: &DependencyDescriptor) -> PathBuf {
        descriptor.repository_dir(&self.root)
    }

    /// Path of the zip archive for `descriptor`.
    pub fn archive_path(&self, descriptor: &DependencyDescriptor) -> PathBuf {
        self.artifact_dir(descriptor).join(format!(
            "{}-{}.zip",
            descriptor.artifact(),
            descriptor.version()
        ))
    }
}

impl ArtifactFetcher for LocalRepository {
    fn fetch(&self, descriptor: &DependencyDescriptor, dest: &Path) -> Result<()> {
        let archive = self.archive_path(descriptor);
        if !archive.is_file() {
            return Err(PackagerError::fetch(
                descriptor,
                format!("artifact not found at {}", archive.display()),
            ));
        }
        info!("Unpacking {} to {}", archive.display(), dest.display());
        extract_zip(&archive, dest).map_err(|e| PackagerError::fetch(descriptor, e))
    }

    fn watch_path(&self, descriptor: &DependencyDescriptor) -> Option<PathBuf> {
        Some(self.artifact_dir(descriptor))
    }
}

/// Extract a zip archive into `dest_dir`.
///
/// Entries whose names would land outside `dest_dir` are rejected.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path).at_path(archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| PackagerError::parse(archive_path, format!("failed to open zip: {e}")))?;

    std::fs::create_dir_all(dest_dir).at_path(dest_dir)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| {
            PackagerError::parse(archive_path, format!("failed to read zip entry: {e}"))
        })?;

        let name = entry.name().to_string();
        let relative = safe_relative_path(&name).ok_or_else(|| {
            PackagerError::parse(
                archive_path,
                format!("path traversal detected in archive entry: {name}"),
            )
        })?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let outpath = dest_dir.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath).at_path(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent).at_path(parent)?;
        }
        let mut outfile = File::create(&outpath).at_path(&outpath)?;
        std::io::copy(&mut entry, &mut outfile).at_path(&outpath)?;
        debug!("Extracted {}", relative.display());
    }

    Ok(())
}

/// Normalize a zip entry name, refusing anything that climbs out of the root.
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_safe_relative_path() {
        assert_eq!(
            safe_relative_path("domain/file.txt"),
            Some(PathBuf::from("domain/file.txt"))
        );
        assert_eq!(safe_relative_path("./a"), Some(PathBuf::from("a")));
        assert_eq!(safe_relative_path("../evil"), None);
        assert_eq!(safe_relative_path("/etc/passwd"), None);
    }

    #[test]
    fn test_extract_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.zip");
        write_zip(
            &archive,
            &[
                ("constants.properties", b"k=v\n"),
                ("domain1/file.xml", b"<x>${k}</x>"),
            ],
        );

        let dest = temp.path().join("out");
        extract_zip(&archive, &dest).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("constants.properties")).unwrap(),
            "k=v\n"
        );
        assert_eq!(
            std::fs::read_to_string(dest.join("domain1/file.xml")).unwrap(),
            "<x>${k}</x>"
        );
    }

    #[test]
    fn test_extract_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", b"nope")]);

        let dest = temp.path().join("out");
        assert!(extract_zip(&archive, &dest).is_err());
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_local_repository_layout() {
        let repo = LocalRepository::new("/home/me/.m2/repository");
        let d = DependencyDescriptor::new("org.example", "base", "1.0");
        assert_eq!(
            repo.archive_path(&d),
            PathBuf::from("/home/me/.m2/repository/org/example/base/1.0/base-1.0.zip")
        );
        assert_eq!(
            repo.watch_path(&d),
            Some(PathBuf::from("/home/me/.m2/repository/org/example/base/1.0"))
        );
    }

    #[test]
    fn test_local_repository_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let repo = LocalRepository::new(temp.path());
        let d = DependencyDescriptor::new("org.example", "missing", "1.0");

        let err = repo.fetch(&d, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, PackagerError::Fetch { ref descriptor, .. } if descriptor == "org.example:missing:1.0"));
    }
}
