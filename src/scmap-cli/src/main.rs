mod cli;
mod commands;
mod config;
mod map_files;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract(args) => {
            commands::extract::handle(&args)?;
        }

        Commands::Dump {
            category,
            data_dir,
            output,
        } => {
            let data_dir = Config::load()?.data_dir(data_dir.as_deref());
            commands::dump::handle(category, &data_dir, output.as_deref())?;
        }

        Commands::Entity {
            category,
            id,
            level,
            data_dir,
        } => {
            let data_dir = Config::load()?.data_dir(data_dir.as_deref());
            commands::entity::handle(category, &id, level, &data_dir)?;
        }

        Commands::Fourcc { command } => match command {
            FourccCommand::Encode { id } => commands::fourcc::encode(&id)?,
            FourccCommand::Decode { value } => commands::fourcc::decode(&value)?,
        },

        Commands::Block { script, offset } => {
            commands::block::handle(&script, offset)?;
        }

        Commands::Configure {
            variant,
            data_dir,
            skins_dir,
            output_dir,
            show,
        } => {
            let update = commands::configure::ConfigUpdate {
                variant,
                data_dir,
                skins_dir,
                output_dir,
            };
            commands::configure::handle(update, show)?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
