use super::lookup;
use crate::context::BuildContext;
use crate::deps::{ArtifactFetcher, load_dependency_list};
use crate::error::{PackagerError, Result};
use crate::watch::{ChangeWatcher, EventSource, ExclusionRules, NotifySource, WatchSummary};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch as signal;
use tracing::{info, warn};

/// Directories the watcher observes: the project, plus each dependency's
/// directory in the local repository.
pub fn watch_roots(ctx: &BuildContext) -> Result<Vec<PathBuf>> {
    let mut roots = vec![ctx.project_dir().to_path_buf()];
    if ctx.config.watch.watch_dependencies {
        let repository = ctx.local_repository()?;
        for descriptor in load_dependency_list(&ctx.dependencies_file())? {
            if let Some(path) = repository.watch_path(&descriptor) {
                roots.push(path);
            }
        }
    }
    Ok(roots)
}

/// Rebuild with the configured command on every settled change until
/// `stop` turns `true`.
pub fn watch(ctx: &BuildContext, stop: signal::Receiver<bool>) -> Result<WatchSummary> {
    let command = lookup(&ctx.config.watch.command)?;

    let mut roots = Vec::new();
    for root in watch_roots(ctx)? {
        match root.canonicalize() {
            Ok(root) => roots.push(root),
            Err(_) => warn!("Not watching {}: it does not exist", root.display()),
        }
    }
    if roots.is_empty() {
        return Err(PackagerError::config("nothing to watch"));
    }

    let rules = exclusion_rules(ctx, &roots);

    let mut source = NotifySource::new(rules.clone())?;
    for root in &roots {
        let added = source.register_tree(root)?;
        info!("Watching {} ({} directories)", root.display(), added);
    }

    let debounce = Duration::from_millis(ctx.config.watch.debounce_ms);
    let summary = ChangeWatcher::new(source, rules, debounce).run(&stop, || {
        (command.run)(ctx)
    })?;
    info!(
        "Watcher stopped after {} rebuilds ({} failed)",
        summary.runs, summary.failures
    );
    Ok(summary)
}

/// Rules for canonical `roots`, keeping the build directory out even
/// before it exists.
fn exclusion_rules(ctx: &BuildContext, roots: &[PathBuf]) -> ExclusionRules {
    ExclusionRules::new(roots.to_vec()).exclude_dir(resolve_path(&ctx.build_dir()))
}

/// `path` made absolute, with symlinks resolved through its longest
/// existing ancestor, so it compares equal to paths `notify` reports.
fn resolve_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut missing = Vec::new();
    let mut existing = absolute.as_path();
    loop {
        if let Ok(resolved) = existing.canonicalize() {
            return missing
                .into_iter()
                .rev()
                .fold(resolved, |dir, name: std::ffi::OsString| dir.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}
