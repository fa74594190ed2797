//! Adaptive Python-project bootstrapper.
//!
//! Selects an entry script, installs what the project declares and imports,
//! then runs it and installs missing modules until it starts cleanly.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pyboot::bootstrap::{BootstrapRequest, preview, run_bootstrap};
use pyboot::core::classifier::PhraseClassifier;
use pyboot::error::BootstrapError;
use pyboot::exit_codes;
use pyboot::io::config::{CONFIG_FILE_NAME, Overrides, load_config};
use pyboot::io::shell::SystemShell;
use pyboot::logging;

#[derive(Parser)]
#[command(
    name = "pyboot",
    version,
    about = "Bootstrap an unfamiliar Python project into a runnable state",
    allow_negative_numbers = true
)]
struct Cli {
    /// Entry script (tried as given, then with .py and .pyw). Auto-selected when omitted.
    entry: Option<String>,

    /// Project directory; every action runs inside it.
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Config file (defaults to `<project>/pyboot.toml`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Create and use an isolated conda environment.
    #[arg(long)]
    conda: bool,

    /// Interpreter version for a new environment.
    #[arg(long)]
    python: Option<String>,

    /// Retry budget for environment and manifest installs.
    #[arg(long)]
    retlenv: Option<i32>,

    /// Retry budget for on-demand installs and run attempts (-1 = unbounded).
    #[arg(long)]
    retry: Option<i32>,

    /// CUDA version for the framework accelerator build.
    #[arg(long)]
    cuda: Option<String>,

    /// Seconds a run may last before it counts as started.
    #[arg(long)]
    wait: Option<u64>,

    /// Print the selected entry and the install plan, execute nothing.
    #[arg(long)]
    plan: bool,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        match err.downcast_ref::<BootstrapError>() {
            Some(known) => eprintln!("{known}"),
            None => eprintln!("{err:#}"),
        }
        std::process::exit(exit_codes::FAILED);
    }
    std::process::exit(exit_codes::OK);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.project.join(CONFIG_FILE_NAME));
    let base = load_config(&config_path)?;
    let overrides = Overrides {
        conda: cli.conda,
        python_version: cli.python.clone(),
        env_retries: cli.retlenv,
        dep_retries: cli.retry,
        cuda: cli.cuda.clone(),
        wait_secs: cli.wait,
    };
    let cfg = overrides.apply(base)?;
    let request = BootstrapRequest {
        project: cli.project.clone(),
        entry: cli.entry.clone(),
    };

    if cli.plan {
        let preview = preview(&request, &cfg)?;
        let json = serde_json::to_string_pretty(&preview).context("serialize plan")?;
        println!("{json}");
        return Ok(());
    }

    run_bootstrap(&request, &cfg, &SystemShell, &PhraseClassifier)?;
    Ok(())
}
