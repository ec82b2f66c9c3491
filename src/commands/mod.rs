//! Named entry points.
//!
//! Every build step is reachable by name through [`COMMANDS`], which is how
//! the watcher picks its rebuild action. `watch` itself is not in the table:
//! it is the loop that runs table entries.

mod deploy;
mod package;
mod watch;

pub use deploy::deploy_to_server;
pub use package::{
    CONTENT_PROPERTIES_FILE, content_package, generate_constants_module, render_constants_module,
    render_content_properties,
};
pub use watch::{watch, watch_roots};

use crate::build;
use crate::context::BuildContext;
use crate::error::{PackagerError, Result};
use tracing::{info, warn};

/// One named build step.
pub struct CommandSpec {
    pub name: &'static str,
    pub about: &'static str,
    pub run: fn(&BuildContext) -> anyhow::Result<()>,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec").field("name", &self.name).finish()
    }
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "generate-filters",
        about: "Flatten the local constants into constants.properties",
        run: run_generate_filters,
    },
    CommandSpec {
        name: "compile",
        about: "Resolve dependencies, merge, substitute and export",
        run: run_compile,
    },
    CommandSpec {
        name: "export-constants",
        about: "Export the compiled constants as JSON",
        run: run_export_constants,
    },
    CommandSpec {
        name: "deploy",
        about: "Copy the compiled configuration into a local server",
        run: run_deploy,
    },
    CommandSpec {
        name: "content-package",
        about: "Write the content package descriptor and tree",
        run: run_content_package,
    },
    CommandSpec {
        name: "generate-constants",
        about: "Generate a Rust module of constants",
        run: run_generate_constants,
    },
];

/// Find a command by name.
pub fn lookup(name: &str) -> Result<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|command| command.name == name)
        .ok_or_else(|| PackagerError::UnknownCommand(name.to_string()))
}

/// Run the named command.
pub fn run(name: &str, ctx: &BuildContext) -> anyhow::Result<()> {
    let command = lookup(name)?;
    info!("Running {}", command.name);
    (command.run)(ctx)
}

fn run_generate_filters(ctx: &BuildContext) -> anyhow::Result<()> {
    build::generate_filters(ctx)?;
    Ok(())
}

fn run_compile(ctx: &BuildContext) -> anyhow::Result<()> {
    let repository = ctx.local_repository()?;
    let report = build::compile(ctx, &repository)?;
    if report.degraded {
        warn!(
            "Compiled configuration at {} has no constants export",
            report.configuration_dir.display()
        );
    }
    if let Some(server_id) = &ctx.config.deploy.server_id {
        deploy_to_server(ctx, server_id)?;
    }
    Ok(())
}

fn run_export_constants(ctx: &BuildContext) -> anyhow::Result<()> {
    if build::export_constants(ctx)?.is_none() {
        info!("No compiled constants to export");
    }
    Ok(())
}

fn run_deploy(ctx: &BuildContext) -> anyhow::Result<()> {
    let server_id = ctx
        .config
        .deploy
        .server_id
        .as_deref()
        .ok_or_else(|| PackagerError::config("deploy needs a server id (--server-id)"))?;
    deploy_to_server(ctx, server_id)?;
    Ok(())
}

fn run_content_package(ctx: &BuildContext) -> anyhow::Result<()> {
    content_package(ctx)?;
    Ok(())
}

fn run_generate_constants(ctx: &BuildContext) -> anyhow::Result<()> {
    generate_constants_module(ctx)?;
    Ok(())
}
