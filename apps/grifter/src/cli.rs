use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api_client::{ApiClient, ResumeApi};
use crate::config::Config;
use crate::models::{AnalysisResponse, ParsedResume};
use crate::report::{render_body, render_report, ProjectReportModel, ReportView};
use crate::workflow::{read_upload, WorkflowController, WorkflowState, WorkflowView};

#[derive(Parser, Debug)]
#[command(
    name = "grifter",
    version,
    about = "Checks whether the projects on a resume are backed by real GitHub code"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        env = "GRIFTER_API_URL",
        help = "Base URL of the verification service"
    )]
    pub api_url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a resume (PDF, DOC, DOCX; max 5MB) and print the verdict.
    Check {
        file: PathBuf,
        #[arg(long, help = "Project index to expand (default: first)")]
        expand: Option<usize>,
    },
    /// Render a saved analysis payload without contacting the service.
    Render {
        payload: PathBuf,
        #[arg(long, help = "Project index to expand (default: first)")]
        expand: Option<usize>,
    },
    /// Ask the service which GitHub profile a resume links to.
    GithubLink { file: PathBuf },
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    session: &'a WorkflowView,
    resume: Option<ParsedResume>,
    report: &'a ReportView,
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Check { file, expand } => check(&file, expand, cli.json, &config).await,
        Commands::Render { payload, expand } => render(&payload, expand, cli.json).await,
        Commands::GithubLink { file } => github_link(&file, &config).await,
    }
}

async fn check(file: &Path, expand: Option<usize>, json: bool, config: &Config) -> Result<()> {
    let api = Arc::new(ApiClient::new(config)?);
    let controller = WorkflowController::new(api);

    let upload = read_upload(file)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    let mut views = controller.subscribe();
    let progress = tokio::spawn(async move {
        let mut lines = ProgressLines::default();
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            for line in lines.update(&view) {
                eprintln!("{line}");
            }
        }
    });

    let result = tokio::select! {
        result = controller.submit(upload) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; resetting session");
            controller.reset();
            progress.abort();
            return Err(anyhow!("Cancelled"));
        }
    };
    progress.abort();
    let view = result.map_err(|e| anyhow!(e.user_message()))?;

    match view.state {
        WorkflowState::Done => {
            let text = view.analysis_text.as_deref().unwrap_or_default();
            let report = build_report(text, expand)?;
            if json {
                let output = CheckOutput {
                    session: &view,
                    resume: controller.parsed_resume(),
                    report: &report,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                if let Some(banner) = &view.completion_banner {
                    eprintln!("{banner}");
                }
                print!("{report}");
            }
            info!(session = %view.session_id, "Report rendered");
            Ok(())
        }
        _ => Err(anyhow!(view
            .error
            .unwrap_or_else(|| "Analysis did not finish".to_string()))),
    }
}

async fn render(payload: &Path, expand: Option<usize>, json: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(payload)
        .await
        .with_context(|| format!("Failed to read {}", payload.display()))?;

    // A saved `/api/analyze-resume` response, or the bare analysis text.
    let text = match serde_json::from_str::<AnalysisResponse>(&raw) {
        Ok(response) => response.into_text().map_err(|e| anyhow!(e.user_message()))?,
        Err(_) => raw,
    };

    let report = build_report(&text, expand)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

async fn github_link(file: &Path, config: &Config) -> Result<()> {
    let upload = read_upload(file)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    let api = ApiClient::new(config)?;
    let value = api.github_link(&upload).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Tracks the last printed status and notice so each is echoed once per change.
#[derive(Debug, Default)]
struct ProgressLines {
    status: Option<String>,
    notice: Option<String>,
}

impl ProgressLines {
    fn update(&mut self, view: &WorkflowView) -> Vec<String> {
        let mut lines = Vec::new();
        for (last, current) in [
            (&mut self.status, &view.status),
            (&mut self.notice, &view.notice),
        ] {
            if *current != *last {
                if let Some(text) = current {
                    lines.push(text.clone());
                }
                *last = current.clone();
            }
        }
        lines
    }
}

fn build_report(text: &str, expand: Option<usize>) -> Result<ReportView> {
    let mut model = ProjectReportModel::new();
    let mut report = render_body(text, &mut model).map_err(|e| anyhow!(e.user_message()))?;

    if let Some(index) = expand {
        if !model.projects().is_empty() && model.expanded() != Some(index) {
            model.toggle_expanded(index);
            report = render_report(&model);
        }
    }
    debug!("Built report with expansion {:?}", model.expanded());
    Ok(report)
}
