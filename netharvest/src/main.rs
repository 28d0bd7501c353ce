use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use netharvest::credentials::local_username;
use netharvest::interrupt::{exit_cancelled, on_interrupt};
use netharvest::{
    BatchRunner, RunConfig, RunOutcome, SshConnector, TerminalPrompt, load_template, logging,
    run_collection,
};

/// Run every command of a template workbook on every device it lists and
/// save the outputs to a result workbook.
#[derive(Parser, Debug)]
#[command(name = "netharvest", version, about)]
struct Cli {
    /// Template workbook: devices on the first sheet, commands on the second
    template: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: cannot start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), netharvest::Error> {
    let config = RunConfig::from_env(cli.template)?;
    logging::init(&config.log_file)?;
    info!("netharvest {} starting with {}", env!("CARGO_PKG_VERSION"), config.template.display());

    let mut template = load_template(&config.template)?;
    config.apply(&mut template);
    println!(
        "Loaded {} device(s) and {} command(s) from {}",
        template.roster.len(),
        template.commands.len(),
        config.template.display()
    );

    // A tokio signal listener disables the default SIGINT exit, so keep one
    // that exits for the whole run.
    if let Err(e) = on_interrupt(|| {
        warn!("interrupted, exiting");
        eprintln!("\nInterrupted.");
        exit_cancelled()
    }) {
        warn!("cannot watch for Ctrl-C: {e}");
    }

    let username = local_username()?;
    let connector = SshConnector::new().host_key_verification(config.host_key_verification);
    let runner = BatchRunner::new(connector);

    let outcome = run_collection(&template, username, TerminalPrompt, &runner, &config.output).await?;
    let report = match outcome {
        RunOutcome::Completed(report) => report,
        RunOutcome::Cancelled => {
            println!();
            eprintln!("Cancelled.");
            // The blocked prompt thread would hold the runtime open.
            exit_cancelled()
        }
    };

    println!("{}", "-".repeat(80));
    println!("Results written to {}", config.output.display());

    println!("{} succeeded, {} failed", report.succeeded(), report.failed());
    for failure in &report.failures {
        println!("  {failure}");
    }
    info!("run complete: {} succeeded, {} failed", report.succeeded(), report.failed());
    Ok(())
}
