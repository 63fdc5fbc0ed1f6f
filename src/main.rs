use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};
use quality_gate::{
    config::{Config, DEFAULT_CONFIG_FILE},
    license::parse_license_report,
    model::{parse_suppress_until, utc_offset},
    output::{
        license_json_report, license_junit_report, print_license_failures, print_stale_whitelist,
        print_suppression_violations, suppression_json_report, OutputFormat,
    },
    scan_report::parse_scan_report,
    suppression::{generate, parse_suppressions, serialize_suppressions, update},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{error, info, warn};

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const SUPPRESSION_VIOLATION: u8 = 2;
    pub const LICENSE_VIOLATION: u8 = 3;
}

#[derive(Parser)]
#[command(name = "quality-gate")]
#[command(
    author,
    version,
    about = "Gate builds on suppression hygiene and dependency license policy"
)]
struct Cli {
    /// Path to the config file (default: quality-gate.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the suppression file for entries lacking a justification
    CheckSuppressions {
        /// Suppression file (default: from config)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// How far out an expiry may lie, in days from now (default: from config)
        #[arg(long)]
        max_days: Option<i64>,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Generate a suppression file from a vulnerability scan report
    GenerateSuppressions {
        /// JUnit-style scan report
        #[arg(short, long)]
        report: PathBuf,

        /// Existing suppression file to carry still-relevant entries forward from
        #[arg(short, long)]
        previous: Option<PathBuf>,

        /// Expiry for generated entries (ISO-8601; absent means indefinite)
        #[arg(short, long)]
        until: Option<String>,

        /// Output file
        #[arg(short, long, default_value = "dependency-check-suppression.xml")]
        output: PathBuf,

        /// Zone offset for rendered dates (e.g. +02:00)
        #[arg(short, long, default_value = "UTC")]
        zone: String,
    },

    /// Rewrite the expiry of every dated entry in a suppression file
    UpdateSuppressions {
        /// Suppression file to update
        #[arg(short, long)]
        file: PathBuf,

        /// New expiry (ISO-8601; indefinite entries are preserved)
        #[arg(short, long)]
        until: Option<String>,

        /// Output file (default: rewrite in place)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Zone offset for rendered dates (e.g. +02:00)
        #[arg(short, long, default_value = "UTC")]
        zone: String,
    },

    /// Check the dependency license report against the policy
    CheckLicenses {
        /// License report (JSON)
        #[arg(short, long)]
        report: PathBuf,

        /// Additionally write the result as a JUnit XML report
        #[arg(long)]
        junit_report: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn run() -> Result<u8> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::CheckSuppressions {
            file,
            max_days,
            format,
        } => check_suppressions(&config, file, max_days, &format),
        Commands::GenerateSuppressions {
            report,
            previous,
            until,
            output,
            zone,
        } => generate_suppressions(&report, previous.as_deref(), until.as_deref(), &output, &zone),
        Commands::UpdateSuppressions {
            file,
            until,
            output,
            zone,
        } => update_suppressions(&file, until.as_deref(), output.as_deref(), &zone),
        Commands::CheckLicenses {
            report,
            junit_report,
            format,
        } => check_licenses(&config, &report, junit_report.as_deref(), &format),
        Commands::Config { init, path } => {
            handle_config(cli.config.as_deref(), init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn check_suppressions(
    config: &Config,
    file: Option<PathBuf>,
    max_days: Option<i64>,
    format: &str,
) -> Result<u8> {
    if config.suppression_check.skip {
        warn!("suppression check is disabled!");
        return Ok(exit_codes::SUCCESS);
    }

    let format = OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?;
    let path = file.unwrap_or_else(|| config.suppression_check.suppression_file.clone());

    if !path.exists() {
        info!("no suppression file at {}, nothing to check", path.display());
        return Ok(exit_codes::SUCCESS);
    }

    let entries = parse_suppressions(&read_file(&path)?)?;

    let now = Utc::now();
    let mut policy = config.suppression_policy(now)?;
    if let Some(days) = max_days {
        policy = policy.with_max_suppress_until(now + chrono::Duration::days(days));
    }

    let violations = policy.check(&entries);
    for violation in &violations {
        error!("{}", violation);
    }

    match format {
        OutputFormat::Table => print_suppression_violations(&violations),
        OutputFormat::Json => println!("{}", suppression_json_report(&violations)?),
    }

    if violations.is_empty() {
        Ok(exit_codes::SUCCESS)
    } else {
        error!(
            "{} entries of {} have neither a false-positive note nor an appropriate expiry",
            violations.len(),
            path.display()
        );
        Ok(exit_codes::SUPPRESSION_VIOLATION)
    }
}

fn generate_suppressions(
    report: &Path,
    previous: Option<&Path>,
    until: Option<&str>,
    output: &Path,
    zone: &str,
) -> Result<u8> {
    let zone = parse_zone(zone)?;
    let until = parse_until(until)?;

    let scan_report = parse_scan_report(&read_file(report)?)?;

    // A missing previous suppression file is empty input, not an error.
    let previous_entries = match previous {
        Some(path) if path.exists() => parse_suppressions(&read_file(path)?)?,
        _ => Vec::new(),
    };

    let entries = generate(
        &scan_report,
        (!previous_entries.is_empty()).then_some(previous_entries.as_slice()),
        until,
    );
    write_file(output, &serialize_suppressions(&entries, zone))?;

    info!(
        "wrote {} suppression entries to {}",
        entries.len(),
        output.display()
    );
    Ok(exit_codes::SUCCESS)
}

fn update_suppressions(
    file: &Path,
    until: Option<&str>,
    output: Option<&Path>,
    zone: &str,
) -> Result<u8> {
    let zone = parse_zone(zone)?;
    let until = parse_until(until)?;

    let entries = parse_suppressions(&read_file(file)?)?;
    let updated = update(&entries, until);

    let output = output.unwrap_or(file);
    write_file(output, &serialize_suppressions(&updated, zone))?;

    info!(
        "wrote {} suppression entries to {}",
        updated.len(),
        output.display()
    );
    Ok(exit_codes::SUCCESS)
}

fn check_licenses(
    config: &Config,
    report: &Path,
    junit_report: Option<&Path>,
    format: &str,
) -> Result<u8> {
    if config.license_check.skip {
        warn!("license check is disabled!");
        return Ok(exit_codes::SUCCESS);
    }

    let format = OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?;
    let dependencies = parse_license_report(&read_file(report)?)?;
    let policy = config.license_policy()?;
    let evaluation = policy.evaluate(&dependencies, Utc::now());

    if !evaluation.stale_whitelist.is_empty() {
        let patterns: Vec<&str> = evaluation
            .stale_whitelist
            .iter()
            .map(|entry| entry.module_name_pattern.as_str())
            .collect();
        warn!(
            "the following whitelisted dependencies have expired: [{}]",
            patterns.join(", ")
        );
    }

    for (module, licenses) in evaluation.failures_by_module() {
        error!(
            "licenses of the module {} are not allowed (licenses are [{}])",
            module,
            licenses.join(", ")
        );
    }

    match format {
        OutputFormat::Table => {
            print_license_failures(&evaluation);
            print_stale_whitelist(&evaluation);
        }
        OutputFormat::Json => println!("{}", license_json_report(&evaluation)?),
    }

    if let Some(path) = junit_report {
        write_file(path, &license_junit_report(&evaluation))?;
    }

    if evaluation.is_clean() {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::LICENSE_VIOLATION)
    }
}

fn handle_config(config_path: Option<&Path>, init: bool, show_path: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if show_path {
        println!("{}", path.display());
        return Ok(());
    }

    if init {
        if path.exists() {
            println!("Config file already exists at: {}", path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save(&path)?;
        println!("Created config file at: {}", path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        println!("Config file: {}", path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'quality-gate config --init' to create one.");
        println!();
        println!("Config path: {}", path.display());
    }

    Ok(())
}

fn parse_zone(zone: &str) -> Result<FixedOffset> {
    match zone {
        "UTC" | "utc" | "Z" => Ok(utc_offset()),
        other => other
            .parse::<FixedOffset>()
            .map_err(|e| anyhow::anyhow!("invalid zone offset {other:?}: {e}")),
    }
}

fn parse_until(until: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    until
        .map(parse_suppress_until)
        .transpose()
        .map_err(Into::into)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
