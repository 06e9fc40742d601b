mod logger;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use pdf_jobs::{
    CompressionLevel, ErrorKind, JobError, JobOutcome, JobRequest, JobRunner, LifecycleManager,
    PageRange, Password, SplitAction, Upload, WorkspaceConfig,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pdft", about = "PDF page recomposition tools", version)]
struct Cli {
    /// Workspace configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for uploads awaiting processing
    #[arg(long, global = true)]
    staging_dir: Option<PathBuf>,

    /// Directory for finished artifacts
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// More log output (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Concatenate PDFs in the order given
    Merge {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Split a PDF into chunks or explicit page ranges
    Split {
        file: PathBuf,

        /// Pages in each output file
        #[arg(long, conflicts_with = "ranges", required_unless_present = "ranges")]
        pages_per_file: Option<u32>,

        /// Inclusive page range, e.g. 3-7 (repeatable)
        #[arg(long = "range", value_name = "START-END", id = "ranges")]
        ranges: Vec<PageRange>,
    },

    /// Stamp "Page N" in the top-right corner of every page
    Number { file: PathBuf },

    /// Rewrite a PDF with compressed streams and resampled images
    Compress {
        file: PathBuf,

        #[arg(long, default_value = "medium", value_enum)]
        level: LevelArg,
    },

    /// Encrypt a PDF with a password
    Protect {
        file: PathBuf,

        #[arg(long)]
        password: String,
    },

    /// Build one PDF with a page per image
    Images {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Fetch an artifact once; it is deleted afterwards
    Download {
        reference: String,

        /// Destination file or directory
        #[arg(long)]
        to: PathBuf,
    },

    /// Remove expired uploads and artifacts
    Sweep,
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Low,
    Medium,
    High,
}

impl From<LevelArg> for CompressionLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Low => Self::Low,
            LevelArg::Medium => Self::Medium,
            LevelArg::High => Self::High,
        }
    }
}

impl Cli {
    async fn workspace_config(&self) -> Result<WorkspaceConfig> {
        let mut config = match &self.config {
            Some(path) => WorkspaceConfig::load(path)
                .await
                .with_context(|| format!("loading config {}", path.display()))?,
            None => WorkspaceConfig::default(),
        };
        if let Some(dir) = &self.staging_dir {
            config.staging_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn exit_code(kind: ErrorKind) -> ExitCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Unreadable => ExitCode::from(2),
        ErrorKind::NotFound => ExitCode::from(3),
        ErrorKind::Io | ErrorKind::Defect => ExitCode::from(1),
    }
}

async fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Upload::new(name, bytes))
}

async fn read_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        uploads.push(read_upload(path).await?);
    }
    Ok(uploads)
}

/// Turns a producing command into a request. `None` for the housekeeping ones.
async fn build_request(command: Commands) -> Result<Option<JobRequest>> {
    let request = match command {
        Commands::Merge { files } => JobRequest::Merge {
            files: read_uploads(&files).await?,
        },
        Commands::Split {
            file,
            pages_per_file,
            ranges,
        } => JobRequest::Split {
            file: read_upload(&file).await?,
            action: match pages_per_file {
                Some(pages_per_file) => SplitAction::ByPages { pages_per_file },
                None => SplitAction::ByRange { ranges },
            },
        },
        Commands::Number { file } => JobRequest::Number {
            file: read_upload(&file).await?,
        },
        Commands::Compress { file, level } => JobRequest::Compress {
            file: read_upload(&file).await?,
            level: level.into(),
        },
        Commands::Protect { file, password } => JobRequest::Protect {
            file: read_upload(&file).await?,
            password: Password(password),
        },
        Commands::Images { files } => JobRequest::ImagesToPdf {
            images: read_uploads(&files).await?,
        },
        Commands::Download { .. } | Commands::Sweep => return Ok(None),
    };
    Ok(Some(request))
}

fn report_failure(err: &JobError) -> ExitCode {
    println!("{}", JobOutcome::failed(err).to_json());
    exit_code(err.kind())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.workspace_config().await?;
    let lifecycle = LifecycleManager::new(config);
    lifecycle.prepare().await?;
    let runner = JobRunner::new(lifecycle);

    match cli.command {
        Commands::Download { reference, to } => match runner.download(&reference).await {
            Ok(download) => {
                let target = if to.is_dir() {
                    to.join(&download.file_name)
                } else {
                    to
                };
                tokio::fs::write(&target, &download.bytes)
                    .await
                    .with_context(|| format!("writing {}", target.display()))?;
                println!("{} -> {}", download.file_name, target.display());
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(report_failure(&err)),
        },

        Commands::Sweep => {
            let report = runner.lifecycle().sweep().await;
            println!(
                "Removed {} staged files and {} artifacts ({} failures)",
                report.staged_removed, report.artifacts_removed, report.failures
            );
            Ok(ExitCode::SUCCESS)
        }

        command => {
            let Some(request) = build_request(command).await? else {
                return Ok(ExitCode::SUCCESS);
            };
            match runner.run(request).await {
                Ok(outcome) => {
                    println!("{}", outcome.to_json());
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => Ok(report_failure(&err)),
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = logger::StderrLogger::level_for(cli.verbose, cli.quiet);
    if let Err(err) = logger::StderrLogger::new(level).init() {
        eprintln!("logger unavailable: {}", err);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
