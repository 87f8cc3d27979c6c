//! Command line driver
//!
//! Accepts either the positional form `<workspace> <project> <output>` or the
//! named flags `--workspace= --project= --output=`, looks the names up in
//! Asana, resolves the project's tasks and writes the report.

use crate::client::AsanaClient;
use crate::config::Config;
use crate::error::ExportError;
use crate::export::{ExportFormat, write_report};
use crate::model::parser::parse_date_filter;
use crate::model::{Project, Status, Task, Workspace};
use crate::resolver::{Resolver, TaskFilter};
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "asana-export")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Export the tasks, subtasks and comments of an Asana project to CSV or HTML")]
pub struct Args {
    /// Workspace name (positional form)
    #[arg(value_name = "WORKSPACE", conflicts_with = "workspace")]
    pub workspace_pos: Option<String>,
    /// Project name (positional form)
    #[arg(value_name = "PROJECT", conflicts_with = "project")]
    pub project_pos: Option<String>,
    /// Output file (positional form)
    #[arg(value_name = "OUTPUT", conflicts_with = "output")]
    pub output_pos: Option<PathBuf>,

    /// Workspace name
    #[arg(long)]
    pub workspace: Option<String>,
    /// Project name
    #[arg(long)]
    pub project: Option<String>,
    /// Output file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Only tasks modified since this date (YYYY-MM-DD)
    #[arg(long = "modified_since", alias = "modified-since", value_parser = parse_date_filter)]
    pub modified_since: Option<String>,
    /// Only tasks incomplete or completed since this date (YYYY-MM-DD)
    #[arg(long = "completed_since", alias = "completed-since", value_parser = parse_date_filter)]
    pub completed_since: Option<String>,

    /// Report format; inferred from the output extension when omitted
    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,
    /// Configuration file path
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Fully validated invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub workspace: String,
    pub project: String,
    pub output: PathBuf,
    pub format: ExportFormat,
    pub filter: TaskFilter,
}

impl Args {
    pub fn into_request(self) -> Result<ExportRequest, ExportError> {
        let workspace = non_empty(self.workspace.or(self.workspace_pos))
            .ok_or(ExportError::MissingArgument("a workspace name"))?;
        let project = non_empty(self.project.or(self.project_pos))
            .ok_or(ExportError::MissingArgument("a project name"))?;
        let output = self
            .output
            .or(self.output_pos)
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ExportError::MissingArgument("an output filename"))?;
        let format = self
            .format
            .unwrap_or_else(|| ExportFormat::from_path(&output));

        Ok(ExportRequest {
            workspace,
            project,
            output,
            format,
            filter: TaskFilter {
                modified_since: self.modified_since,
                completed_since: self.completed_since,
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub exported: usize,
    pub skipped: usize,
    pub total_with_subtasks: usize,
}

pub async fn find_workspace(client: &AsanaClient, name: &str) -> Result<Workspace, ExportError> {
    client
        .get_workspaces()
        .await?
        .into_iter()
        .find(|w| w.name == name)
        .ok_or_else(|| ExportError::WorkspaceNotFound(name.to_string()))
}

pub async fn find_project(
    client: &AsanaClient,
    workspace: &Workspace,
    name: &str,
) -> Result<Project, ExportError> {
    client
        .get_projects(&workspace.gid)
        .await?
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| ExportError::ProjectNotFound {
            workspace: workspace.name.clone(),
            project: name.to_string(),
        })
}

/// Runs one export against `client`. The output file is created before any API call.
pub async fn export(client: AsanaClient, request: &ExportRequest) -> Result<ExportSummary> {
    let file = File::create(&request.output).map_err(|source| ExportError::Output {
        path: request.output.clone(),
        source,
    })?;

    println!(
        "Getting tasks for project {} in workspace {}...",
        request.project, request.workspace
    );

    let workspace = find_workspace(&client, &request.workspace).await?;
    let project = find_project(&client, &workspace, &request.project).await?;
    info!(workspace = %workspace.gid, project = %project.gid, "located project");

    let resolver = Resolver::new(client);
    let mut skipped = 0;
    let tasks: Vec<Task> = resolver
        .resolve_project(&project.gid, &request.filter, |p| {
            if p.status == Status::Skip {
                skipped += 1;
            }
            println!("\t[{}/{}] {} {}", p.sequence, p.total, p.status, p.name);
        })
        .await
        .with_context(|| format!("Failed to fetch tasks for project '{}'", project.name))?;

    write_report(request.format, BufWriter::new(file), &project, &tasks)
        .with_context(|| format!("Failed to write {}", request.output.display()))?;

    Ok(ExportSummary {
        exported: tasks.len(),
        skipped,
        total_with_subtasks: tasks.iter().map(Task::tree_size).sum(),
    })
}

/// Entry point used by the binary after logging is set up.
pub async fn run(args: Args) -> Result<()> {
    let config_path = args.config.clone();
    let request = args.into_request()?;
    let config = match config_path {
        Some(path) => Config::load_file(&path)?,
        None => Config::load()?,
    };
    let client = AsanaClient::from_config(&config)?;

    let summary = export(client, &request).await?;

    println!(
        "Exported {} tasks ({} including subtasks), skipped {} shared with other projects.",
        summary.exported, summary.total_with_subtasks, summary.skipped
    );
    println!("Output written to {}.", request.output.display());
    Ok(())
}
