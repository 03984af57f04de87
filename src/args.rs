//! This module defines the command line arguments Cairn accepts.

use std::path::PathBuf;
use termcolor::ColorChoice;


#[derive(Debug, clap::Parser)]
#[clap(about = "Server for a headless-CMS backed content website.")]
pub(crate) struct Args {
    /// Whether to use colors in the output. 'auto' only uses colors when
    /// writing to a terminal.
    #[clap(long, global = true, default_value = "auto", value_parser = parse_color_choice)]
    pub(crate) color: ColorChoice,

    #[clap(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Command {
    /// Starts the HTTP server.
    Serve {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Queries the CMS for all collection frontpages and writes the
    /// generated collection registry file.
    ///
    /// If anything goes wrong (missing configuration, CMS unreachable, ...),
    /// a registry containing only the built-in default slugs is written
    /// instead, so that builds never block on CMS availability. Only fails if
    /// even that file cannot be written.
    GenerateCollections {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Exports the CMS schema (all document and object type definitions) as
    /// JSON.
    ExportSchema {
        /// Target file. If not specified, the schema is written to stdout.
        target: Option<PathBuf>,
    },

    /// Checks config, generated files and the CMS connection to find
    /// problems in Cairn's environment. Exits with 0 if everything is Ok,
    /// and with 1 otherwise.
    Check {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Outputs a template for the configuration file (which includes
    /// descriptions or all options).
    WriteConfig {
        /// Target file. If not specified, the template is written to stdout.
        target: Option<PathBuf>,
    },
}

impl Command {
    /// Short name used in log file paths (`${cmd}`).
    pub(crate) fn log_name(&self) -> &'static str {
        match self {
            Command::Serve { .. } => "serve",
            Command::GenerateCollections { .. } => "generate",
            _ => "other",
        }
    }
}

#[derive(Debug, clap::Args)]
pub(crate) struct Shared {
    /// Path to the configuration file. If this is not specified, Cairn will
    /// check `CAIRN_CONFIG_PATH` and then try opening `config.toml` or
    /// `/etc/cairn/config.toml`.
    #[clap(short, long)]
    pub(crate) config: Option<PathBuf>,
}

impl Args {
    pub(crate) fn stdout_color(&self) -> ColorChoice {
        resolve_color(self.color, std::io::IsTerminal::is_terminal(&std::io::stdout()))
    }

    pub(crate) fn stderr_color(&self) -> ColorChoice {
        resolve_color(self.color, std::io::IsTerminal::is_terminal(&std::io::stderr()))
    }
}

fn resolve_color(choice: ColorChoice, is_terminal: bool) -> ColorChoice {
    match choice {
        ColorChoice::Auto if !is_terminal => ColorChoice::Never,
        other => other,
    }
}

fn parse_color_choice(s: &str) -> Result<ColorChoice, String> {
    match s {
        "auto" => Ok(ColorChoice::Auto),
        "always" => Ok(ColorChoice::Always),
        "never" => Ok(ColorChoice::Never),
        other => Err(format!("invalid color choice '{other}', expected auto, always or never")),
    }
}
