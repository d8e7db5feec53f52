//! IRIDA Uploader CLI
//!
//! The `irida-uploader` command validates sequencing runs against IRIDA and
//! uploads their sequence files.
//!
//! ## Commands
//!
//! - `validate`: parse a run and check it against IRIDA, without uploading
//! - `upload`: validate and upload a single run directory
//! - `batch`: upload every run found under a directory
//! - `send-project`: create a new project on IRIDA

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use irida_api::{IridaApi, IridaClient, IridaConfig, RemoteProject};
use irida_model::Project;
use serde::Serialize;
use sheet_parsers::ParserKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

use uploader_core::{process_run, send_project, RunMode, RunOutcome};

#[derive(Parser)]
#[command(name = "irida-uploader")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Upload sequencing runs to IRIDA", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines and JSON results
    #[arg(long, global = true)]
    json: bool,

    /// Sample sheet layout: miseq, miniseq or directory
    #[arg(short, long, global = true, env = "IRIDA_PARSER", default_value = "miseq")]
    parser: ParserKind,

    #[command(flatten)]
    irida: IridaArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection settings; each falls back to its environment variable.
#[derive(Args, Debug, Default)]
struct IridaArgs {
    /// IRIDA API base URL
    #[arg(long, global = true, env = "IRIDA_BASE_URL")]
    base_url: Option<String>,

    /// OAuth2 client id
    #[arg(long, global = true, env = "IRIDA_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth2 client secret
    #[arg(long, global = true, env = "IRIDA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// IRIDA user name
    #[arg(long, global = true, env = "IRIDA_USERNAME")]
    username: Option<String>,

    /// IRIDA password
    #[arg(long, global = true, env = "IRIDA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "IRIDA_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

impl IridaArgs {
    fn config(&self) -> IridaConfig {
        let mut config = IridaConfig::from_env();
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(client_id) = &self.client_id {
            config.client_id = client_id.clone();
        }
        if let Some(client_secret) = &self.client_secret {
            config.client_secret = client_secret.clone();
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config = config.with_timeout(timeout_secs);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check a run against IRIDA without uploading it
    ///
    /// Samples missing from their project are created, as they would be
    /// before an upload.
    Validate {
        /// Run directory containing SampleSheet.csv
        directory: PathBuf,
    },

    /// Validate and upload a single run
    Upload {
        /// Run directory containing SampleSheet.csv
        directory: PathBuf,
    },

    /// Upload every run found in the subdirectories of a directory
    Batch {
        /// Directory holding one run per subdirectory
        directory: PathBuf,

        /// Also upload runs the instrument has not marked complete
        #[arg(long)]
        include_incomplete: bool,
    },

    /// Create a new project on IRIDA
    SendProject {
        /// Project name (at least 5 characters)
        #[arg(long)]
        name: String,

        /// Project description
        #[arg(long)]
        description: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    uploader_core::init_tracing(cli.json, level);

    let config = cli.irida.config();
    info!(url = %config.base_url, parser = %cli.parser, "irida-uploader {}", uploader_core::VERSION);
    let client = IridaClient::new(config).context("Failed to create IRIDA client")?;

    match cli.command {
        Commands::Validate { directory } => {
            cmd_run(&client, cli.parser, &directory, RunMode::ValidateOnly, cli.json).await
        }
        Commands::Upload { directory } => {
            cmd_run(&client, cli.parser, &directory, RunMode::Upload, cli.json).await
        }
        Commands::Batch {
            directory,
            include_incomplete,
        } => cmd_batch(&client, cli.parser, &directory, include_incomplete, cli.json).await,
        Commands::SendProject { name, description } => {
            cmd_send_project(&client, &name, description, cli.json).await
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Validate, and optionally upload, one run directory
async fn cmd_run<R>(remote: &R, parser: ParserKind, directory: &Path, mode: RunMode, json: bool) -> Result<()>
where
    R: IridaApi + ?Sized,
{
    let outcome = process_run(remote, parser, directory, mode)
        .await
        .with_context(|| format!("Failed to process run {}", directory.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(directory, &outcome);
    }

    if outcome.is_success() {
        Ok(())
    } else {
        anyhow::bail!("Run {} is not valid for upload", directory.display())
    }
}

/// Result of one run within a batch
#[derive(Debug, Serialize)]
struct BatchEntry {
    run: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<RunOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    skipped: bool,
}

impl BatchEntry {
    fn succeeded(&self) -> bool {
        self.skipped || self.outcome.as_ref().is_some_and(RunOutcome::is_success)
    }
}

/// Upload every run under `directory`, one after another
///
/// A failing run does not stop the batch; the command fails at the end if
/// any run failed.
async fn cmd_batch<R>(
    remote: &R,
    parser: ParserKind,
    directory: &Path,
    include_incomplete: bool,
    json: bool,
) -> Result<()>
where
    R: IridaApi + ?Sized,
{
    let runs = parser
        .find_runs(directory)
        .with_context(|| format!("Failed to search {} for runs", directory.display()))?;

    let mut entries = Vec::with_capacity(runs.len());
    for run in runs {
        if !include_incomplete && !run.is_complete() {
            warn!(run = %run.path.display(), "run is not complete, skipping");
            entries.push(BatchEntry {
                run: run.path,
                outcome: None,
                error: None,
                skipped: true,
            });
            continue;
        }

        let entry = match process_run(remote, parser, &run.path, RunMode::Upload).await {
            Ok(outcome) => BatchEntry {
                run: run.path,
                outcome: Some(outcome),
                error: None,
                skipped: false,
            },
            Err(e) => {
                warn!(run = %run.path.display(), error = %e, "run failed");
                BatchEntry {
                    run: run.path,
                    outcome: None,
                    error: Some(e.to_string()),
                    skipped: false,
                }
            }
        };
        entries.push(entry);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_batch(&entries);
    }

    let failed = entries.iter().filter(|e| !e.succeeded()).count();
    if failed == 0 {
        Ok(())
    } else {
        anyhow::bail!("{} of {} runs failed", failed, entries.len())
    }
}

/// Create a project on IRIDA
async fn cmd_send_project<R>(remote: &R, name: &str, description: Option<String>, json: bool) -> Result<()>
where
    R: RemoteProject + ?Sized,
{
    let project = Project::named(name, description);
    let created = send_project(remote, &project)
        .await
        .with_context(|| format!("Failed to create project '{}'", name))?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "project": name, "created": created })
        );
    } else if created {
        println!("✓ Project '{}' created", name);
    } else {
        println!("✗ IRIDA did not create project '{}'", name);
    }

    if created {
        Ok(())
    } else {
        anyhow::bail!("Project '{}' was not created", name)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_outcome(directory: &Path, outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Invalid { validation } => {
            println!("✗ {}: not valid for upload", directory.display());
            for error in &validation.error_list {
                println!("  - {}", error);
            }
        }
        RunOutcome::Validated { projects, samples } => {
            println!(
                "✓ {}: valid ({} project(s), {} sample(s))",
                directory.display(),
                projects,
                samples
            );
        }
        RunOutcome::Uploaded {
            upload_id,
            projects,
            samples,
            started_at,
            finished_at,
        } => {
            let secs = (*finished_at - *started_at).num_seconds();
            println!(
                "✓ {}: uploaded as sequencing run {} ({} project(s), {} sample(s), {}s)",
                directory.display(),
                upload_id,
                projects,
                samples,
                secs
            );
        }
    }
}

fn print_batch(entries: &[BatchEntry]) {
    if entries.is_empty() {
        println!("No runs found");
        return;
    }
    for entry in entries {
        if entry.skipped {
            println!("- {}: skipped (not complete)", entry.run.display());
        } else if let Some(outcome) = &entry.outcome {
            print_outcome(&entry.run, outcome);
        } else if let Some(error) = &entry.error {
            println!("✗ {}: {}", entry.run.display(), error);
        }
    }
    let ok = entries.iter().filter(|e| e.succeeded()).count();
    println!();
    println!("Summary: {}/{} runs succeeded", ok, entries.len());
}
