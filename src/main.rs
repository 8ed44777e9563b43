//! config-bootstrap CLI

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use config_bootstrap::config::DEFAULT_DESTINATION;
use config_bootstrap::{
    discover_secret_groups, scan_template, Backoff, BootstrapConfig, BootstrapError,
    FixSuggestion,
};

#[derive(Parser)]
#[command(name = "config-bootstrap")]
#[command(about = "Render a secret-templated config from SSM before the service starts")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct RunArgs {
    /// SSM parameter holding the config template
    #[arg(long, env = "GATUS_CONFIG_SSM_PARAM")]
    param_name: Option<String>,

    /// AWS region for SSM and Secrets Manager
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Where the rendered config is written
    #[arg(long, env = "CONFIG_DESTINATION", default_value = DEFAULT_DESTINATION)]
    destination: PathBuf,

    /// Path to the aws CLI binary
    #[arg(long, env = "AWS_CLI_PATH", default_value = "aws")]
    aws_cli: String,

    /// Timeout for each aws CLI call, in seconds
    #[arg(long, env = "AWS_CLI_TIMEOUT_SECS", default_value_t = 30)]
    command_timeout: u64,

    /// Delay after each failed fetch attempt, in seconds (one entry per attempt)
    #[arg(
        long,
        env = "CONFIG_FETCH_BACKOFF",
        value_delimiter = ',',
        default_value = "0,2,4,8,16"
    )]
    backoff: Vec<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect a local template without contacting AWS
    Scan {
        /// Path to the template file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Warnings and errors to stderr, everything else to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(
            std::io::stderr
                .with_max_level(tracing::Level::WARN)
                .or_else(std::io::stdout),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Scan { file, format }) => scan(&file, format),
        None => run(cli.run).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn run(args: RunArgs) -> Result<(), BootstrapError> {
    let groups = discover_secret_groups(std::env::vars());
    for (group, reference) in groups.iter() {
        info!(group, strategy = reference.strategy(), "Secret group configured");
    }

    let config = BootstrapConfig {
        parameter_name: args.param_name.ok_or_else(|| {
            BootstrapError::Config("missing --param-name (GATUS_CONFIG_SSM_PARAM)".into())
        })?,
        region: args
            .region
            .ok_or_else(|| BootstrapError::Config("missing --region (AWS_REGION)".into()))?,
        destination: args.destination,
        aws_cli: args.aws_cli,
        command_timeout: Duration::from_secs(args.command_timeout),
        backoff: Backoff::from_secs(&args.backoff),
        groups,
    };

    let report = config.into_bootstrapper()?.run().await?;

    println!(
        "{} Final config written to {} (attempt {}, {})",
        "✓".green(),
        report.destination.display().to_string().cyan(),
        report.attempts,
        report.resolution.summary()
    );
    Ok(())
}

fn scan(file: &Path, format: Format) -> Result<(), BootstrapError> {
    let template = std::fs::read_to_string(file)?;
    let groups = discover_secret_groups(std::env::vars());
    let report = scan_template(&template, &groups);

    match format {
        Format::Text => print!("{}", report.render_text()),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(BootstrapError::MalformedPlaceholders {
            count: report.malformed.len(),
            file: file.display().to_string(),
        })
    }
}
