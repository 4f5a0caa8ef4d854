mod batch;
mod bsub;
mod cli;
mod deps;
mod error;
mod esubmit;
mod placeholders;
mod quantiles;
mod script;
mod settings;
use crate::bsub::BsubArgs;
use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use env_logger::Env;
use log::debug;

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Bsub {
            show_settings_file,
            no_execution,
            cac,
            time,
            settings_file,
            batch_file,
            batch_id,
        } => {
            // Without -e, clap has already required all three positionals.
            let (settings_file, batch_file, batch_id) =
                match (settings_file, batch_file, batch_id) {
                    (Some(s), Some(b), Some(id)) if !show_settings_file => (s, b, id),
                    _ => {
                        println!("{}", settings::EXAMPLE_SETTINGS);
                        return Ok(());
                    }
                };
            let summary = crate::bsub::run(&BsubArgs {
                settings_file,
                batch_file,
                batch_id,
                execute: !no_execution,
                cac,
                time,
            })?;
            println!(
                "...done. Processed {} jobs for {} nodes.",
                summary.jobs, summary.nodes
            );
            debug!("{} shellscripts written", summary.scripts.len());
            Ok(())
        }
        Commands::Deps { pom } => crate::deps::report(&pom),
        Commands::Quantiles {
            quantiles,
            column,
            count,
            input,
        } => crate::quantiles::run(&input, &quantiles, column, count),
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();
    let args = Cli::parse();

    // Every error ends the run with the same status; only the message differs.
    if let Err(e) = run(args.command) {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }
}
