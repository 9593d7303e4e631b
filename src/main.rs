//! CLI entry point for the NECTA results tool.
//!
//! Provides subcommands for printing and ranking results, exporting results
//! sheets and report cards, sending results and announcements by SMS, and
//! entering scores from teachers' score sheets.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use necta_results::aggregate::{aggregate, rank_cohort};
use necta_results::config::Settings;
use necta_results::fetch::BasicClient;
use necta_results::notify::{
    AfricasTalkingGateway, Announcement, Audience, DispatchLog, Outgoing, announcement_messages,
    dispatch, result_messages,
};
use necta_results::output::{print_json, print_pretty};
use necta_results::publish::{upload_artifact, write_artifact};
use necta_results::records::Records;
use necta_results::records::types::{SessionKey, Term};
use necta_results::render::sheet::{render_score_sheet, render_sheet};
use necta_results::render::{Artifact, ReportHeader, document::render_report_cards};
use necta_results::scope::Scope;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "necta_results")]
#[command(about = "Grade, rank and publish NECTA secondary-school results", long_about = None)]
struct Cli {
    /// Directory holding the records CSV files (overrides RECORDS_DIR)
    #[arg(long, global = true)]
    records: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct ScopeArgs {
    /// Form (1-4)
    #[arg(short, long)]
    form: u8,

    /// Stream; omit to cover every stream of the form
    #[arg(short, long)]
    stream: Option<String>,

    /// Exam term, e.g. "Mid Term", "Terminal", "Annual"
    #[arg(short, long)]
    term: Term,

    /// Exam year
    #[arg(short, long)]
    year: u16,
}

impl ScopeArgs {
    fn scope(&self) -> Scope {
        Scope::new(self.form, self.stream.as_deref(), self.term, self.year)
    }
}

#[derive(Args, Debug, Clone)]
struct ExportArgs {
    /// Directory to write the file into
    #[arg(short, long, default_value = "exports")]
    output_dir: PathBuf,

    /// Gzip compress the file before writing or uploading
    #[arg(long, default_value_t = false)]
    gzip: bool,

    /// Optional: S3 bucket to upload the file to (e.g., "my-bucket")
    #[arg(long)]
    s3_bucket: Option<String>,

    /// Optional: key prefix inside the bucket
    #[arg(long)]
    s3_prefix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one student's aggregated report as JSON
    Report {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Admission number, e.g. PAR/2025/001
        #[arg(short, long)]
        admission: String,
    },
    /// Rank a cohort and print the ranking
    Rank {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Export the cohort's full results sheet (CSV)
    ExportSheet {
        #[command(flatten)]
        scope: ScopeArgs,

        #[command(flatten)]
        export: ExportArgs,
    },
    /// Export printable report cards for every student in the cohort
    ExportReports {
        #[command(flatten)]
        scope: ScopeArgs,

        #[command(flatten)]
        export: ExportArgs,
    },
    /// Send each parent their child's results by SMS
    SendResults {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Print the messages instead of sending them
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Broadcast an announcement by SMS
    Announce {
        /// Announcement identifier, used to avoid sending it twice
        #[arg(long)]
        id: String,

        #[arg(long, value_enum)]
        target: Audience,

        #[arg(long)]
        title: String,

        #[arg(long)]
        message: String,

        /// Print the messages instead of sending them
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Write a blank score sheet for a subject assignment
    ScoreSheet {
        /// Upload token of the assignment
        #[arg(long)]
        token: Uuid,

        #[arg(short, long, default_value = "score_sheets")]
        output_dir: PathBuf,
    },
    /// Import a completed score sheet
    ImportScores {
        /// Upload token of the assignment
        #[arg(long)]
        token: Uuid,

        /// Completed score sheet (CSV)
        #[arg(long)]
        file: PathBuf,

        /// Mark the upload complete; the token is then spent
        #[arg(long, default_value_t = false)]
        complete: bool,
    },
    /// Lock a stream's exam session against further score entry
    Lock {
        #[arg(short, long)]
        form: u8,

        #[arg(short, long)]
        stream: String,

        #[arg(short, long)]
        term: Term,

        #[arg(short, long)]
        year: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/necta_results.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("necta_results.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let records_dir = cli.records.unwrap_or_else(|| settings.records_dir.clone());
    let mut records = Records::load(&records_dir)
        .with_context(|| format!("loading records from {}", records_dir.display()))?;
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Report { scope, admission } => {
            let scope = scope.scope();
            let report = aggregate(&records, &admission, &scope)?;
            print_json(&report)?;
        }
        Commands::Rank { scope } => {
            let cohort = rank_cohort(&records, &scope.scope())?;
            info!(scope = %cohort.scope, students = cohort.len(), "Cohort ranked");
            for (student, report) in &cohort.entries {
                info!(
                    rank = report.rank,
                    admission_number = %student.admission_number,
                    name = %student.full_name,
                    total = report.total,
                    mean = report.mean,
                    points = report.best_seven_points,
                    division = %report.division,
                    "Rank"
                );
            }
        }
        Commands::ExportSheet { scope, export } => {
            let scope = scope.scope();
            let cohort = rank_cohort(&records, &scope)?;
            let header = ReportHeader::new(
                &settings.school_name,
                &settings.school_contact,
                &scope,
                &records,
                today,
            );
            publish(render_sheet(&header, &cohort)?, &export).await?;
        }
        Commands::ExportReports { scope, export } => {
            let scope = scope.scope();
            let cohort = rank_cohort(&records, &scope)?;
            let header = ReportHeader::new(
                &settings.school_name,
                &settings.school_contact,
                &scope,
                &records,
                today,
            );
            publish(render_report_cards(&header, &cohort)?, &export).await?;
        }
        Commands::SendResults { scope, dry_run } => {
            let scope = scope.scope();
            let cohort = rank_cohort(&records, &scope)?;
            let header = ReportHeader::new(
                &settings.school_name,
                &settings.school_contact,
                &scope,
                &records,
                today,
            );
            let messages = result_messages(&cohort, &header);
            send(&settings, messages, dry_run).await?;
        }
        Commands::Announce {
            id,
            target,
            title,
            message,
            dry_run,
        } => {
            let announcement = Announcement {
                id,
                title,
                message,
                target,
            };
            let messages =
                announcement_messages(&announcement, records.teachers(), records.students());
            send(&settings, messages, dry_run).await?;
        }
        Commands::ScoreSheet { token, output_dir } => {
            let assignment = records
                .assignment_by_token(token)
                .with_context(|| format!("no assignment with token {token}"))?;
            let file_name = format!("{}_{}.csv", assignment.subject_code, token);
            let rows = records.score_sheet_template(token)?;
            write_artifact(&output_dir, &render_score_sheet(&file_name, &rows)?)?;
        }
        Commands::ImportScores {
            token,
            file,
            complete,
        } => {
            let reader = std::fs::File::open(&file)
                .with_context(|| format!("opening {}", file.display()))?;
            let imported = records.import_score_sheet(token, reader)?;
            if complete {
                records.complete_upload(token)?;
            }
            records.save(&records_dir)?;
            info!(imported, complete, "Scores saved");
        }
        Commands::Lock {
            form,
            stream,
            term,
            year,
        } => {
            let key = SessionKey {
                form,
                stream,
                term,
                year,
            };
            records.lock_session(&key)?;
            records.save(&records_dir)?;
        }
    }

    Ok(())
}

/// Writes the artifact locally and, when a bucket is given, uploads it.
async fn publish(artifact: Artifact, export: &ExportArgs) -> Result<()> {
    let artifact = if export.gzip {
        artifact.gzipped()?
    } else {
        artifact
    };
    write_artifact(&export.output_dir, &artifact)?;

    if let Some(bucket) = &export.s3_bucket {
        let config = aws_config::load_from_env().await;
        let client = aws_sdk_s3::Client::new(&config);
        upload_artifact(&client, bucket, export.s3_prefix.as_deref(), &artifact).await?;
    }
    Ok(())
}

/// Sends the messages through the configured gateway, or prints them.
async fn send(settings: &Settings, messages: Vec<Outgoing>, dry_run: bool) -> Result<()> {
    if messages.is_empty() {
        warn!("No messages to send");
        return Ok(());
    }
    if dry_run {
        for message in &messages {
            print_pretty(message);
            for chunk in &message.chunks {
                println!("{} -> {chunk}", message.number.as_deref().unwrap_or("(no number)"));
            }
        }
        return Ok(());
    }

    let gateway = AfricasTalkingGateway::new(BasicClient::new()?, settings.gateway()?)?;
    let mut log = DispatchLog::open(&settings.dispatch_log)?;
    let summary = dispatch(Arc::new(gateway), &mut log, messages, settings.sms_concurrency).await?;
    print_json(&summary)?;
    Ok(())
}
