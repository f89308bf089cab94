use std::{env, path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{anyhow, Context, Result};
use tfharness::{
    locate_terraform_or_exit, HarnessConfig, ScenarioContext, Stage, SuiteFile, SuiteReport,
    TerraformCli, TracingReporter, VarDelivery,
};

struct RunArgs {
    suite: PathBuf,
    parallel: bool,
    only: Option<Stage>,
}

enum Command {
    Help,
    Run(RunArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let command = match parse_args(env::args().skip(1).collect()) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("tfharness: {err:#}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    match command {
        Command::Help => {
            print_usage();
            ExitCode::SUCCESS
        }
        Command::Run(args) => match run(args).await {
            Ok(report) if report.all_passed() => ExitCode::SUCCESS,
            Ok(_) => ExitCode::FAILURE,
            Err(err) => {
                eprintln!("tfharness: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(err) = dotenvy::dotenv() {
        tracing::debug!(target: "tfharness", "no .env loaded: {err}");
    }
}

fn parse_args(mut args: Vec<String>) -> Result<Command> {
    if args.is_empty() {
        return Err(anyhow!("E-TFH-0001: missing command"));
    }
    let cmd = args.remove(0);
    match cmd.as_str() {
        "run" => parse_run(&args).map(Command::Run),
        "--help" | "-h" | "help" => Ok(Command::Help),
        other => Err(anyhow!("E-TFH-0002: unknown command '{other}'")),
    }
}

fn parse_run(args: &[String]) -> Result<RunArgs> {
    let mut suite: Option<PathBuf> = None;
    let mut parallel = false;
    let mut only = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--parallel" => parallel = true,
            "--only" => {
                idx += 1;
                let raw = args
                    .get(idx)
                    .context("E-TFH-0003: --only expects dry, unit or integration")?;
                only = Some(
                    Stage::parse(raw)
                        .with_context(|| format!("E-TFH-0004: unknown stage '{raw}'"))?,
                );
            }
            flag if flag.starts_with("--") => {
                return Err(anyhow!("E-TFH-0005: unexpected flag '{flag}' for run"));
            }
            path => {
                if suite.replace(PathBuf::from(path)).is_some() {
                    return Err(anyhow!("E-TFH-0006: more than one suite file given"));
                }
            }
        }
        idx += 1;
    }
    let suite = suite.context("E-TFH-0007: run expects a suite file")?;
    Ok(RunArgs {
        suite,
        parallel,
        only,
    })
}

async fn run(args: RunArgs) -> Result<SuiteReport> {
    // Before anything else: without terraform no case can run at all.
    let exe = locate_terraform_or_exit();

    let config = HarnessConfig::from_env();
    let mut suite = SuiteFile::load(&args.suite)
        .with_context(|| format!("load suite {}", args.suite.display()))?;
    if config.var_delivery == VarDelivery::Environment {
        suite = suite.with_var_delivery(VarDelivery::Environment);
    }

    let mut settings = config.scenario_settings();
    if let Some(provider) = suite.provider.clone() {
        settings.provider = provider;
    }
    let driver = Arc::new(TerraformCli::from_config(exe, &config));
    let ctx = ScenarioContext::new(driver, Arc::new(TracingReporter)).with_settings(settings);

    tracing::info!(
        target: "tfharness",
        cases = suite.case_count(),
        parallel = args.parallel || suite.parallel,
        "running suite {}",
        args.suite.display()
    );
    let report = suite.run(&ctx, args.only, args.parallel).await;
    emit_report(&report);
    Ok(report)
}

fn emit_report(report: &SuiteReport) {
    for outcome in &report.outcomes {
        match outcome.message() {
            None => println!("--- PASS: {}", outcome.name),
            Some(message) => {
                println!("--- FAIL: {}", outcome.name);
                for line in message.lines() {
                    println!("    {line}");
                }
            }
        }
    }
    let verdict = if report.all_passed() { "ok" } else { "FAIL" };
    println!(
        "{verdict}: {} passed, {} failed",
        report.passed(),
        report.failed()
    );
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  tfharness run <suite.json> [--parallel] [--only dry|unit|integration]");
    eprintln!("  tfharness --help");
}
