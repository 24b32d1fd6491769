//! Contract Desk
//!
//! Command-line front end for the contract dashboard: sign in, browse
//! contracts and their risk insights, and upload contract documents.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contract_desk::auth::{GateDecision, RouteGate};
use contract_desk::contracts::present::labels;
use contract_desk::contracts::{format_date, format_percent};
use contract_desk::upload::{
    format_file_size, is_accepted_file, FileRef, LogNotifier, UploadStatus,
};
use contract_desk::{AppError, AppState, Config};

#[derive(Parser)]
#[command(name = "contract-desk", version, about = "Contract dashboard client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and persist the session
    Login {
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and clear the persisted session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Browse contracts
    Contracts {
        #[command(subcommand)]
        command: ContractsCommand,
    },
    /// Upload contract documents
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ContractsCommand {
    /// List all contracts
    List,
    /// Show one contract with clauses, insights and evidence
    Show { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contract_desk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            let e = AppError::from(e);
            tracing::error!("Failed to load config from env: {}", e);
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    let cli = Cli::parse();

    let state = match AppState::new(config, Arc::new(LogNotifier)).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize: {}", e);
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    let result = run(&state, cli.command).await;
    state.shutdown().await;

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            match e.downcast_ref::<AppError>() {
                Some(app) => {
                    if let AppError::Contract(contract) = app {
                        eprintln!("{}", contract.user_message());
                    }
                    ExitCode::from(app.exit_code() as u8)
                }
                None => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(state: &AppState, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Login { username, password } => {
            let session = state
                .auth()
                .login(&username, &password)
                .await
                .map_err(AppError::from)?;
            if let Some(user) = session.user() {
                println!("Signed in as {} <{}>", user.display_name, user.email);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Logout => {
            state
                .auth()
                .logout()
                .await
                .map_err(AppError::from)
                .context("signed out of this run, but the saved session could not be cleared")?;
            println!("Signed out");
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami => {
            require_session(state).await?;
            if let Some(user) = state.auth().current_user() {
                println!("{} <{}> ({})", user.display_name, user.email, user.username);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Contracts { command } => {
            require_session(state).await?;
            match command {
                ContractsCommand::List => Ok(list_contracts(state).await?),
                ContractsCommand::Show { id } => Ok(show_contract(state, &id).await?),
            }
        }
        Command::Upload { paths } => {
            require_session(state).await?;
            upload_files(state, paths).await
        }
    }
}

async fn require_session(state: &AppState) -> Result<(), AppError> {
    let session = state.auth().settled().await;
    match RouteGate::decide(&session) {
        GateDecision::Allow => Ok(()),
        GateDecision::Wait | GateDecision::RedirectToLogin => {
            eprintln!("Sign in first: contract-desk login <username> --password <secret>");
            Err(AppError::Unauthenticated)
        }
    }
}

async fn list_contracts(state: &AppState) -> Result<ExitCode, AppError> {
    let contracts = state.contracts().list().await?;

    println!("{:<10} {:<36} {:<12} {:<8} {}", "ID", "NAME", "STATUS", "RISK", "EXPIRY");
    for contract in contracts {
        println!(
            "{:<10} {:<36} {:<12} {:<8} {}",
            contract.id,
            contract.name,
            contract.status.to_string(),
            contract.risk.to_string(),
            format_date(&contract.expiry)
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn show_contract(state: &AppState, id: &str) -> Result<ExitCode, AppError> {
    let record = state.contracts().detail(id).await?;
    println!("{}: {}", labels::HEADER, record.name);
    println!("Parties: {}", record.parties);
    println!("Status:  {}", record.status);
    println!("Risk:    {}", record.risk);
    println!(
        "Term:    {} - {}",
        format_date(&record.start),
        format_date(&record.expiry)
    );

    println!("\n{}", labels::KEY_CLAUSES);
    for clause in &record.clauses {
        println!(
            "  - {} ({} confidence): {}",
            clause.title,
            format_percent(clause.confidence),
            clause.summary
        );
    }

    println!("\n{}", labels::AI_INSIGHTS);
    for insight in &record.insights {
        println!("  [{}] {}", insight.risk, insight.message);
    }

    println!("\n{}", labels::EVIDENCE);
    for evidence in &record.evidence {
        println!(
            "  {} ({} relevant): {}",
            evidence.source,
            format_percent(evidence.relevance),
            evidence.snippet
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Read the accepted files, skipping the rest with a warning
///
/// Size and type are checked from metadata before any content is read.
async fn load_files(paths: Vec<PathBuf>) -> Vec<FileRef> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let size = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "Skipping file: not a regular file");
                continue;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping file: cannot read");
                continue;
            }
        };

        if !is_accepted_file(&name, size) {
            tracing::warn!(
                path = %path.display(),
                "Skipping file: only PDF, DOC, DOCX files up to 10MB are accepted"
            );
            continue;
        }

        match FileRef::from_path(&path).await {
            Ok(file) => files.push(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping file: cannot read");
            }
        }
    }

    files
}

async fn upload_files(state: &AppState, paths: Vec<PathBuf>) -> anyhow::Result<ExitCode> {
    let files = load_files(paths).await;
    if files.is_empty() {
        eprintln!("No files to upload");
        return Ok(ExitCode::FAILURE);
    }

    let tracker = state.uploads();
    for entry in tracker.add_files(files).await {
        println!("{:<10} {} ({})", entry.status, entry.name, format_file_size(entry.size));
    }

    tracker.wait_settled().await;

    println!();
    for entry in tracker.entries().await {
        match &entry.error {
            Some(error) => println!("{:<10} {} - {}", entry.status, entry.name, error),
            None => println!("{:<10} {}", entry.status, entry.name),
        }
    }

    if tracker.all_succeeded().await {
        Ok(ExitCode::SUCCESS)
    } else {
        let failed = tracker
            .entries()
            .await
            .iter()
            .filter(|e| e.status == UploadStatus::Error)
            .count();
        eprintln!("{} upload(s) failed; add the files again to retry", failed);
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_files_skips_rejected_and_unreadable_paths() {
        let dir = tempfile::tempdir().unwrap();
        let lease = dir.path().join("lease.pdf");
        let notes = dir.path().join("notes.txt");
        let large = dir.path().join("large.docx");
        std::fs::write(&lease, b"%PDF-1.7").unwrap();
        std::fs::write(&notes, b"not a contract").unwrap();
        std::fs::File::create(&large)
            .unwrap()
            .set_len(11 * 1024 * 1024)
            .unwrap();

        let files = load_files(vec![
            lease,
            dir.path().join("missing.pdf"),
            notes,
            large,
            dir.path().to_path_buf(),
        ])
        .await;

        let names: Vec<_> = files.iter().map(|f| f.name().to_string()).collect();
        assert_eq!(names, vec!["lease.pdf"]);
        assert_eq!(files[0].size(), 8);
    }
}
