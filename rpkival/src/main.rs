//! rpkival: RPKI object validator.
//!
//! `serve` runs the validation worker: work items arrive as JSON lines on
//! stdin and responses leave as JSON lines on stdout. `file` validates
//! individual objects against a set of TALs and prints a report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use rpkival_lib::{Entity, RType, Status, Validator, ValidatorConfig, MAX_CERT_DEPTH};

#[derive(Parser)]
#[command(
    name = "rpkival",
    about = "Validate RPKI repository objects against trust anchors",
    after_help = "EXAMPLES:\n\
                  \n  rpkival serve --cache-dir valid < entities.jsonl\
                  \n  rpkival file --tal ripe.tal --cache-dir cache rsync://rpki.ripe.net/repo/x.roa\
                  \n  rpkival file --tal ripe.tal --json cache/rpki.ripe.net/repository"
)]
struct Cli {
    /// Increase log verbosity (repeat for more). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process JSON-line work items from stdin until EOF
    Serve {
        /// Directory that rsync:// URIs map into for AIA and CRL lookups
        #[arg(long, default_value = "valid")]
        cache_dir: PathBuf,
        /// Validate as of this Unix time instead of now
        #[arg(long)]
        at_time: Option<i64>,
        /// Maximum number of CA certificates below a trust anchor
        #[arg(long, default_value_t = MAX_CERT_DEPTH)]
        max_depth: usize,
    },
    /// Validate individual files or rsync URIs and print a report
    File {
        /// Trust anchor locator (may be repeated)
        #[arg(long = "tal")]
        tals: Vec<PathBuf>,
        /// Cache directory; rsync:// URIs and trust anchors resolve below it
        #[arg(long, default_value = ".")]
        cache_dir: PathBuf,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Validate as of this Unix time instead of now
        #[arg(long)]
        at_time: Option<i64>,
        /// Maximum number of CA certificates below a trust anchor
        #[arg(long, default_value_t = MAX_CERT_DEPTH)]
        max_depth: usize,
        /// Files, directories or rsync:// URIs to validate
        #[arg(required = true)]
        files: Vec<String>,
    },
}

impl Commands {
    /// Validator settings taken from the subcommand's flags.
    fn config(&self) -> ValidatorConfig {
        let (cache_dir, at_time, max_depth) = match self {
            Commands::Serve {
                cache_dir,
                at_time,
                max_depth,
            } => (cache_dir, at_time, max_depth),
            Commands::File {
                cache_dir,
                at_time,
                max_depth,
                ..
            } => (cache_dir, at_time, max_depth),
        };
        ValidatorConfig {
            max_cert_depth: *max_depth,
            at_time: *at_time,
            aia_base: cache_dir.clone(),
            ..ValidatorConfig::default()
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn is_object_file(path: &Path) -> bool {
    path.to_str()
        .and_then(RType::from_filename)
        .is_some()
}

/// Expand directories into the object files below them, sorted.
fn expand_inputs(inputs: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            let mut files: Vec<String> = walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_object_file(e.path()))
                .map(|e| e.path().display().to_string())
                .collect();
            files.sort();
            out.extend(files);
        } else {
            out.push(input.clone());
        }
    }
    out
}

fn serve(config: ValidatorConfig) -> Result<()> {
    let mut validator = Validator::new(config);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for (lineno, line) in stdin.lock().lines().enumerate() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let entity: Entity = serde_json::from_str(&line)
            .with_context(|| format!("Malformed entity on line {}", lineno + 1))?;
        let response = validator
            .handle(entity)
            .with_context(|| format!("Aborting on line {}", lineno + 1))?;
        if let Some(resp) = response {
            serde_json::to_writer(&mut out, &resp).context("Failed to write response")?;
            out.write_all(b"\n").context("Failed to write response")?;
            out.flush().context("Failed to write response")?;
        }
    }
    debug!(
        auths = validator.context().auths.len(),
        crls = validator.context().crls.len(),
        "input closed"
    );
    Ok(())
}

/// Returns the number of files that failed validation.
fn file_mode(config: ValidatorConfig, tals: &[PathBuf], inputs: &[String], json: bool) -> Result<usize> {
    let mut validator = Validator::new(config);
    for tal in tals {
        let data = std::fs::read(tal)
            .with_context(|| format!("Failed to read TAL: {}", tal.display()))?;
        let name = tal.display().to_string();
        validator
            .load_tal(&name, &data)
            .with_context(|| format!("Could not parse TAL: {}", name))?;
    }

    let mut failures = 0;
    for (i, file) in expand_inputs(inputs).iter().enumerate() {
        let report = validator.check_file(file)?;
        if report.status == Status::Failed {
            failures += 1;
        }
        if json {
            println!("{}", rpkival_lib::to_json(&report)?);
        } else {
            if i > 0 {
                println!("--");
            }
            print!("{}", rpkival_lib::display_report(&report));
        }
    }
    Ok(failures)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.command.config();
    let result = match cli.command {
        Commands::Serve { .. } => serve(config).map(|()| 0),
        Commands::File {
            tals, json, files, ..
        } => file_mode(config, &tals, &files, json).map(|failures| i32::from(failures > 0)),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rpkival").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn serve_defaults() {
        let config = parse(&["serve"]).command.config();
        assert_eq!(config.aia_base, PathBuf::from("valid"));
        assert_eq!(config.max_cert_depth, MAX_CERT_DEPTH);
        assert_eq!(config.at_time, None);
    }

    #[test]
    fn file_defaults() {
        let config = parse(&["file", "x.roa"]).command.config();
        assert_eq!(config.aia_base, PathBuf::from("."));
        assert_eq!(config.max_cert_depth, MAX_CERT_DEPTH);
    }

    #[test]
    fn both_modes_take_the_same_flags() {
        for mode in [&["serve"][..], &["file", "x.roa"][..]] {
            let mut args = mode.to_vec();
            args.extend(["--cache-dir", "cache", "--max-depth", "4", "--at-time", "1700000000"]);
            let config = parse(&args).command.config();
            assert_eq!(config.aia_base, PathBuf::from("cache"));
            assert_eq!(config.max_cert_depth, 4);
            assert_eq!(config.at_time, Some(1_700_000_000));
        }
    }
}
