//! NodeFlow CLI Entry Point
//!
//! Runs a submission file through the standard capability set.
//!
//! # Usage
//!
//! ```bash
//! # Run to completion and print the JSON report
//! nodeflow flow.json --caller-id alice
//!
//! # Stream one JSON line per completed step
//! nodeflow flow.yaml --stream
//!
//! # Show the compiled chain without executing anything
//! nodeflow flow.yaml --dry-run
//! ```

use std::env;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use log::{error, info};

use nodeflow::capability::notify::LogMailer;
use nodeflow::capability::CapabilityRegistry;
use nodeflow::config::Settings;
use nodeflow::execution::Engine;
use nodeflow::monitoring::ExecutionTimeline;
use nodeflow::pipeline::CompiledChain;
use nodeflow::secrets::{ChainedSecretStore, EnvSecretStore, FileSecretStore};
use nodeflow::workflow::load_submission;
use nodeflow::{APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default, PartialEq)]
struct Config {
    submission_path: Option<String>,
    stream: bool,
    dry_run: bool,
    caller_id: Option<String>,
    config_path: Option<String>,
    secrets_path: Option<String>,
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner. Goes to stderr; stdout carries results.
fn print_banner() {
    eprintln!();
    eprintln!("{} v{}", APP_NAME, VERSION);
    eprintln!("Linear Workflow Engine");
    eprintln!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: nodeflow [OPTIONS] <SUBMISSION_FILE>");
    println!();
    println!("Arguments:");
    println!("  <SUBMISSION_FILE>   Submission in JSON (.json) or YAML");
    println!();
    println!("Options:");
    println!("  --stream            Print one JSON event per step as it completes");
    println!("  --dry-run           Show the compiled chain without executing");
    println!("  --caller-id ID      Caller identity used for credential lookup");
    println!("  --config PATH       YAML settings file");
    println!("  --secrets PATH      JSON secrets file");
    println!("  --verbose           Enable debug logging and print a step timeline");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  nodeflow flow.json --caller-id alice");
    println!("  nodeflow flow.yaml --stream --secrets ~/.nodeflow/secrets.json");
    println!("  nodeflow flow.yaml --dry-run");
}

/// Returns the value following an option.
fn option_value(args: &[String], i: usize, option: &str) -> Result<String, String> {
    args.get(i)
        .cloned()
        .ok_or_else(|| format!("{} requires a value", option))
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--stream" => config.stream = true,
            "--dry-run" => config.dry_run = true,
            "--verbose" | "-v" => config.verbose = true,
            "--caller-id" => {
                i += 1;
                config.caller_id = Some(option_value(args, i, "--caller-id")?);
            }
            "--config" => {
                i += 1;
                config.config_path = Some(option_value(args, i, "--config")?);
            }
            "--secrets" => {
                i += 1;
                config.secrets_path = Some(option_value(args, i, "--secrets")?);
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if config.submission_path.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.submission_path = Some(arg.clone());
            }
        }
        i += 1;
    }

    if config.submission_path.is_none() {
        return Err("Missing submission file".to_string());
    }

    Ok(config)
}

/// Renders the chain as `__start__ -> a -> b -> __end__`.
fn format_chain(chain: &CompiledChain) -> String {
    let edges = chain.edges();
    let mut nodes: Vec<&str> = edges.iter().map(|(from, _)| from.as_str()).collect();
    if let Some((_, last)) = edges.last() {
        nodes.push(last);
    }
    nodes.join(" -> ")
}

fn print_dry_run(chain: &CompiledChain) {
    println!("{}", format_chain(chain));
    println!();
    for (i, step) in chain.steps().iter().enumerate() {
        let descriptor = step.descriptor();
        println!(
            "{:>2}. [seq {}] {} ({})",
            i + 1,
            descriptor.seq,
            step.label(),
            descriptor.capability_id
        );
        if let Some(input) = descriptor.seed_input() {
            println!("      input: {}", input);
        }
    }
}

fn print_summary(steps: usize, timeline: &ExecutionTimeline, verbose: bool) {
    let degraded = timeline.degraded_count();
    let line = format!(
        "{} steps completed in {:.2?}, {} degraded",
        steps,
        timeline.elapsed(),
        degraded
    );

    eprintln!();
    if degraded == 0 {
        eprintln!("{}", line.green());
    } else {
        eprintln!("{}", line.yellow());
    }

    if verbose {
        eprintln!("{}", timeline.gantt_chart());
    }
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);
    print_banner();

    let settings = Settings::load(config.config_path.as_deref().map(Path::new))?;
    let caller_id = config.caller_id.clone().or_else(|| settings.caller_id.clone());

    let mut secrets = ChainedSecretStore::new();
    if let Some(path) = config.secrets_path.as_ref().or(settings.secrets_file.as_ref()) {
        info!("Secrets file: {}", path);
        secrets = secrets.with_store(FileSecretStore::load(path));
    }
    let secrets = secrets.with_store(EnvSecretStore);

    let registry = CapabilityRegistry::standard(&settings, Arc::new(secrets), Arc::new(LogMailer));
    let engine = Engine::new(Arc::new(registry));

    let submission_path = config.submission_path.as_deref().unwrap_or_default();
    info!("Loading submission: {}", submission_path);
    let submission = load_submission(submission_path).map_err(|e| {
        error!("Failed to load submission: {}", e);
        format!("Could not load submission from '{}': {}", submission_path, e)
    })?;
    info!(
        "Submission loaded: {} steps, {} side-channel inputs",
        submission.len(),
        submission.additional_input.len()
    );

    if config.dry_run {
        info!("Mode: DRY RUN (capabilities will not execute)");
        let chain = engine.compile(&submission.steps, caller_id)?;
        print_dry_run(&chain);
        return Ok(());
    }

    if config.stream {
        let mut stream = engine.run_stream(&submission, caller_id)?;
        let written = stream.write_ndjson(io::stdout().lock())?;
        print_summary(written, stream.timeline(), config.verbose);
    } else {
        let report = engine.run(&submission, caller_id)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        print_summary(report.len(), &report.timeline, config.verbose);
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
