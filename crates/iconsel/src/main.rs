//! iconsel - browse, preview and select installed icon themes
//!
//! Without a subcommand this opens the GTK dialog (when built with the `gtk`
//! feature) or lists the installed themes.

mod cli;
#[cfg(feature = "gtk")]
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use iconsel_core::{Config, logging};

/// iconsel - browse, preview and select installed icon themes
#[derive(Parser, Debug)]
#[command(name = "iconsel", version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (uses XDG lookup if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print example configuration and exit
    #[arg(long)]
    print_example_config: bool,

    /// Validate configuration and exit (returns non-zero on errors)
    #[arg(long)]
    check_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List installed icon themes in picker order
    List {
        /// Show the resolved list icon for each theme
        #[arg(long)]
        icons: bool,
    },
    /// Show the preview icons a theme resolves
    Preview {
        /// Theme id (directory name); defaults to the current selection
        theme: Option<String>,
    },
    /// Print the currently selected icon theme
    Current,
    /// Select an icon theme
    Set {
        /// Theme id (directory name)
        theme: String,
        /// Let the icon theme override icons from the general theme
        #[arg(long, conflicts_with = "no_overrides")]
        overrides: bool,
        /// Stop the icon theme from overriding the general theme
        #[arg(long)]
        no_overrides: bool,
    },
    /// Open the selection dialog
    #[cfg(feature = "gtk")]
    Dialog,
}

fn main() -> ExitCode {
    let args = Args::parse();

    logging::init(args.verbose);

    if args.print_example_config {
        print!("{}", iconsel_core::config::DEFAULT_CONFIG_TOML);
        return ExitCode::SUCCESS;
    }

    // If --config is specified, it must exist and be valid (no fallback)
    let load_result = match Config::find_and_load(args.config.as_deref()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref source) = load_result.source {
        info!("Loaded configuration from {:?}", source);
    } else if load_result.used_defaults {
        debug!("Using default configuration (no config file found)");
    }

    let config = load_result.config;

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    if args.check_config {
        match load_result.source {
            Some(ref source) => println!("Configuration valid: {}", source.display()),
            None => println!("Configuration valid (using defaults)"),
        }
        if args.verbose > 0 {
            println!("\n{}", config.summary());
        }
        return ExitCode::SUCCESS;
    }

    let result = match args.command {
        Some(Command::List { icons }) => cli::list(&config, icons),
        Some(Command::Preview { theme }) => cli::preview(&config, theme.as_deref()),
        Some(Command::Current) => cli::current(&config),
        Some(Command::Set {
            theme,
            overrides,
            no_overrides,
        }) => {
            let overrides = match (overrides, no_overrides) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            cli::set(&config, &theme, overrides)
        }
        #[cfg(feature = "gtk")]
        Some(Command::Dialog) | None => return ui::run(config),
        #[cfg(not(feature = "gtk"))]
        None => {
            tracing::warn!("Built without GTK support, listing themes instead");
            cli::list(&config, false)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
