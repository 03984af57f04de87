//! The Cairn website server.

use clap::{FromArgMatches, CommandFactory};
use confique::Config as _;
use std::{env, sync::Arc};

use crate::{
    args::{Args, Command},
    cms::SanityClient,
    collections::CollectionRegistry,
    config::Config,
    prelude::*,
};

mod args;
mod cms;
mod cmd;
mod collections;
mod config;
mod events;
mod http;
mod leads;
mod locale;
mod logger;
mod metrics;
mod model;
mod prelude;
mod render;
mod schema;
mod version;


#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Log error in case stdout is not connected and it is logged into a file.
        error!("{:?}", e);

        // Show a somewhat nice representation of the error
        eprintln!();
        eprintln!();
        bunt::eprintln!("{$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", e);
        eprintln!();
        if e.chain().len() > 1 {
            bunt::eprintln!("{$red+italic}Caused by:{/$}");
        }

        for (i, cause) in e.chain().skip(1).enumerate() {
            eprint!(" {: >1$}", "", i * 2);
            eprintln!("‣ {cause}");
        }

        std::process::exit(1);
    }
}

/// Main entry point.
async fn run() -> Result<()> {
    // If `RUST_BACKTRACE` wasn't already set, we default to `1`. Backtraces are
    // almost always useful for debugging and we don't expect panics to occur
    // regularly.
    if env::var("RUST_BACKTRACE") == Err(env::VarError::NotPresent) {
        env::set_var("RUST_BACKTRACE", "1");
    }

    // Parse CLI args. This is a bit roundabout because we want to override
    // the version using some runtime code.
    let args = Args::from_arg_matches(
        &Args::command()
            .version(version::full())
            .get_matches(),
    )?;

    // Configure output via `bunt`
    bunt::set_stdout_color_choice(args.stdout_color());
    bunt::set_stderr_color_choice(args.stderr_color());


    // Dispatch subcommand.
    match &args.cmd {
        Command::Serve { shared } => {
            let config = load_config_and_init_logger(shared, &args)?;
            start_server(config).await?;
        }
        Command::GenerateCollections { shared } => {
            // The registry must be generated even without a usable config
            // file, e.g. in CI builds that only have CMS env variables.
            let config = match load_config_and_init_logger(shared, &args) {
                Ok(config) => Some(config),
                Err(e) => {
                    let log = logger::LogConfig::builder().load()?;
                    logger::init(&log, &args, args.cmd.log_name())?;
                    warn!("Could not load configuration, using environment only: {e:#}");
                    None
                }
            };
            collections::generate::run(config.as_ref()).await?;
        }
        Command::ExportSchema { target } => cmd::export_schema::run(target.as_ref())?,
        Command::Check { shared } => cmd::check::run(shared, &args).await?,
        Command::WriteConfig { target } => config::write_template(target.as_ref())?,
    }

    Ok(())
}

async fn start_server(config: Config) -> Result<()> {
    info!("Starting Cairn {} ...", version::identifier());
    trace!("Configuration: {:#?}", config);

    let registry = CollectionRegistry::load(&config.collections.generated_file)?;
    let source = SanityClient::new(&config.cms)
        .context("failed to create CMS client")?
        .pipe(Arc::new);

    http::serve(config, registry, source).await
        .context("failed to start HTTP server")?;

    Ok(())
}


pub(crate) fn load_config_and_init_logger(shared: &args::Shared, args: &Args) -> Result<Config> {
    // Load configuration.
    let (config, path) = match &shared.config {
        Some(path) => {
            let config = Config::load_from(path)
                .context(format!("failed to load config from '{}'", path.display()))?;
            (config, path.clone())
        }
        None => Config::from_env_or_default_locations()?,
    };

    // Initialize logger. Unfortunately, we can only do this here
    // after reading the config.
    logger::init(&config.log, args, args.cmd.log_name())?;
    info!("Loaded config from '{}'", path.display());

    Ok(config)
}
