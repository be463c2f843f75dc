use clap::Parser;
use formmaster::cli::commands::{cmd_coerce, cmd_extract, cmd_fill};
use formmaster::cli::config::{Cli, Commands, FillSettings, load_config};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Extract { html, scope, format } => {
            cmd_extract(&html, scope.as_deref(), &format)?;
        }
        Commands::Fill {
            html,
            url,
            values,
            endpoint,
            profile,
            mappings,
            data,
            output,
            format,
            annotate,
            scope,
        } => {
            // Resolve settings: CLI > config > defaults
            let settings = FillSettings::resolve(&config, values, endpoint, profile, mappings, data, format);
            let clean = cmd_fill(&html, &url, &settings, scope.as_deref(), output.as_deref(), annotate)?;
            if !clean {
                std::process::exit(1);
            }
        }
        Commands::Coerce { kind, value, options } => {
            cmd_coerce(&kind, &value, &options)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the level follows the `-v` count.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
