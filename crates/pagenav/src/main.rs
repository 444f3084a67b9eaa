mod scenario;

use anyhow::{bail, Context, Error};
use clap::{Parser, Subcommand};
use pagenav_core::logging::RunLog;
use pagenav_core::navigation::{NavigationOptions, NavigationResult, NavigationService};
use pagenav_core::settings::Settings;
use scenario::{Action, Expectation, PrintingHost, Scenario, Step};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pagenav", about = "Run navigation scenarios against the page tree")]
struct Cli {
    /// Settings file; defaults apply when it doesn't exist
    #[arg(long, default_value = "Settings.toml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every step of a scenario and print the tree after each one
    Run {
        scenario: PathBuf,
        /// Also print each structural change
        #[arg(short, long)]
        verbose: bool,
    },
    /// List the pages a scenario defines
    Pages { scenario: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let settings = Settings::load(&cli.settings)?;

    match cli.command {
        Commands::Run { scenario, verbose } => {
            let log = RunLog::start(&settings.logging, &log_scope(&scenario))?;
            tracing::info!(
                scenario = %scenario.display(),
                settings = %cli.settings.display(),
                "scenario started"
            );
            if let Some(path) = log.path() {
                println!("logging to {}", path.display());
            }

            let result = run_scenario(&settings, &scenario, verbose).await;
            if let Err(err) = &result {
                tracing::error!(error = %err, "scenario failed");
            }
            log.finish();
            result
        }
        Commands::Pages { scenario } => {
            let scenario = Scenario::load(&scenario)?;
            for page in &scenario.pages {
                println!("{} ({})", page.name, page.kind);
            }
            Ok(())
        }
    }
}

/// Run logs are grouped by the scenario file they came from.
fn log_scope(scenario: &Path) -> String {
    scenario
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn run_scenario(settings: &Settings, path: &Path, verbose: bool) -> Result<(), Error> {
    let scenario = Scenario::load(path)?;
    let mut service = NavigationService::new(
        Arc::new(scenario.provider()),
        Arc::new(PrintingHost { verbose }),
        &settings.navigation,
    );

    let mut mismatches = 0;
    for (index, step) in scenario.steps.iter().enumerate() {
        let description = step.describe();
        println!("[{}] {}", index + 1, description);

        let result = execute(&mut service, step).await?;
        let outcome = match (&result, step.expect) {
            (result, Expectation::Success) if result.is_success() => None,
            (result, Expectation::Declined) if result.is_declined() => None,
            (result, Expectation::Failure) if !result.is_success() && !result.is_declined() => None,
            (result, expected) => Some(format!("expected {:?}, got {}", expected, summarize(result))),
        };

        match outcome {
            None => println!("  {}", summarize(&result)),
            Some(message) => {
                mismatches += 1;
                tracing::warn!(step = index + 1, action = %description, "{}", message);
                println!("  MISMATCH: {}", message);
            }
        }
        for line in service.tree().outline().lines() {
            println!("    {}", line);
        }
    }

    service.shutdown().await;

    if mismatches > 0 {
        bail!("{} of {} steps didn't behave as expected", mismatches, scenario.steps.len());
    }
    Ok(())
}

async fn execute(service: &mut NavigationService, step: &Step) -> Result<NavigationResult, Error> {
    let parameters = step.parameters();
    let options = NavigationOptions {
        animated: step.animated,
        modal: step.modal,
    };

    let result = match step.action {
        Action::Navigate => {
            let uri = step.uri.as_deref().context("navigate step without uri")?;
            service.navigate(uri, parameters, options).await
        }
        Action::GoBack => service.go_back(parameters, options).await,
        Action::GoBackToRoot => service.go_back_to_root(parameters).await,
        Action::SelectTab => {
            let name = step.name.as_deref().context("select-tab step without name")?;
            service.select_tab(name, parameters).await
        }
    };
    Ok(result)
}

fn summarize(result: &NavigationResult) -> String {
    match result.error() {
        None => "ok".to_string(),
        Some(err) if result.is_declined() => format!("declined ({})", err),
        Some(err) => format!("failed [{:?}]: {}", err.kind(), err),
    }
}
