// src/cli.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use crate::controller::Controller;
use crate::core::{ConfigManager, FsOps, TrackerLedger};
use crate::job_intel::JobScraper;
use crate::scoring::score_documents;
use crate::types::{JobRequest, PipelineOutcome, ResumeDocument};
use crate::utils::sanitize_folder_name;

#[derive(Parser)]
#[command(name = "jobhunt")]
#[command(about = "Turn a job posting and a LaTeX resume into a tailored application bundle")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline for one job posting
    Run(RunArgs),
    /// Score a tailored resume against a base resume
    Score {
        #[arg(long)]
        base: PathBuf,
        #[arg(long)]
        tailored: PathBuf,
        /// Comma-separated ATS keywords
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,
        /// Comma-separated must-have requirements
        #[arg(long, value_delimiter = ',')]
        must_have: Vec<String>,
        #[arg(long, default_value = "adhoc")]
        job_id: String,
    },
    /// List the rows of the application ledger
    Ledger {
        #[arg(long)]
        ledger: Option<PathBuf>,
        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the folder-safe slug for a job title
    Sanitize { title: String },
}

#[derive(Args)]
pub struct RunArgs {
    /// Job posting URL
    #[arg(long)]
    pub job_url: Option<String>,
    /// File containing the job description text
    #[arg(long, conflicts_with = "jd_text")]
    pub jd_file: Option<PathBuf>,
    /// Job description text
    #[arg(long)]
    pub jd_text: Option<String>,
    /// Base LaTeX resume; never modified
    #[arg(long)]
    pub resume: Option<PathBuf>,
    #[arg(long)]
    pub job_id: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// YYYY-MM-DD; marks the application as Applied
    #[arg(long)]
    pub date_applied: Option<NaiveDate>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    #[arg(long)]
    pub ledger: Option<PathBuf>,
    /// Overwrite files in an existing job folder
    #[arg(long)]
    pub force: bool,
}

pub async fn handle_command(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Run(args) => run_pipeline(args).await,

        Command::Score {
            base,
            tailored,
            keywords,
            must_have,
            job_id,
        } => {
            let base = load_document(base).await?;
            let tailored = load_document(tailored).await?;
            let keywords = trimmed(keywords);
            let must_have = trimmed(must_have);

            let report = score_documents(&job_id, &base, &tailored, &keywords, &must_have);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }

        Command::Ledger { ledger, json } => {
            let config = ConfigManager::load()?.with_overrides(None, ledger);
            let ledger = TrackerLedger::new(&config.environment.ledger_path);
            let rows = ledger.read_rows()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No applications recorded in {}", ledger.path().display());
            } else {
                println!(
                    "{:<14} {:<24} {:<32} {:<12} {:<12}",
                    "Job ID", "Company", "Role", "Status", "Applied"
                );
                println!("{}", "-".repeat(98));
                for row in rows {
                    println!(
                        "{:<14} {:<24} {:<32} {:<12} {:<12}",
                        row.job_id, row.company, row.role_title, row.status, row.date_applied
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Sanitize { title } => {
            println!("{}", sanitize_folder_name(&title));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_pipeline(args: RunArgs) -> Result<ExitCode> {
    let config = ConfigManager::load()?.with_overrides(args.output_dir, args.ledger);

    let raw_jd_text = match (args.jd_file, args.jd_text) {
        (Some(path), _) => Some(
            FsOps::read_file_safe(&path)
                .await
                .with_context(|| format!("Failed to read job description {}", path.display()))?,
        ),
        (None, text) => text,
    };

    let request = JobRequest {
        job_url: args.job_url,
        raw_jd_text,
        base_resume_path: args.resume,
        job_id: args.job_id,
        company: args.company,
        location: args.location,
        date_applied: args.date_applied,
        notes: args.notes,
    };

    let scraper = JobScraper::new(&config.fetch)?;
    let controller = Controller::new(
        Arc::new(scraper),
        Arc::new(FsOps),
        config.environment.output_path.clone(),
    )
    .with_overwrite(args.force);
    info!(
        "Output: {}, ledger: {}",
        controller.output_root().display(),
        config.environment.ledger_path.display()
    );

    let mut ledger = TrackerLedger::new(&config.environment.ledger_path);
    let outcome = controller.run(request, &mut ledger).await;
    ledger.close()?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(match outcome {
        PipelineOutcome::Done(_) => ExitCode::SUCCESS,
        PipelineOutcome::WaitingForInput { .. } => ExitCode::from(2),
        PipelineOutcome::Failed { .. } => ExitCode::FAILURE,
    })
}

async fn load_document(path: PathBuf) -> Result<ResumeDocument> {
    let content = FsOps::read_file_safe(&path).await?;
    Ok(ResumeDocument::new(path, content))
}

fn trimmed(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
