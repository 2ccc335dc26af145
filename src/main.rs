//! Haul command line
//!
//! Loads a catalog snapshot into memory and renders its relationship graph
//! or reports store health.

use clap::{Arg, ArgAction, ArgMatches, Command};
use haul::core::config::OutputFormat;
use haul::storage::create_store;
use haul::system::metrics;
use haul::{Catalog, Config, Result};
use std::io::Write;
use tracing::info;

fn main() -> Result<()> {
    let config_arg = Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .global(true)
        .help("Configuration file path");
    let log_level_arg = Arg::new("log-level")
        .long("log-level")
        .value_name("LEVEL")
        .global(true)
        .help("Log level (trace, debug, info, warn, error)");
    let catalog_arg = Arg::new("catalog")
        .long("catalog")
        .value_name("FILE")
        .global(true)
        .help("JSON catalog snapshot to load");

    let matches = Command::new("haul")
        .version(haul::VERSION)
        .about("Inventory catalog of components, assemblies and kits.")
        .arg(config_arg)
        .arg(log_level_arg)
        .arg(catalog_arg)
        .subcommand_required(true)
        .subcommand(
            Command::new("graph")
                .about("Render the containment graph")
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("Output format (dot, json, svg, png, pdf)"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write to FILE instead of stdout"),
                )
                .arg(
                    Arg::new("metrics")
                        .long("metrics")
                        .action(ArgAction::SetTrue)
                        .help("Print collected metrics to stderr when done"),
                ),
        )
        .subcommand(Command::new("healthcheck").about("Ping the store and report its health"))
        .get_matches();

    // Load configuration
    let mut config = if let Some(config_path) = matches.get_one::<String>("config") {
        Config::from_file(config_path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    haul::init(&config.logging)?;
    info!("Starting {} v{}", haul::NAME, haul::VERSION);

    let store = create_store(&config.store)?;
    let catalog = Catalog::from_config(store, &config.store);

    match matches.subcommand() {
        Some(("graph", sub)) => run_graph(&catalog, &config, sub),
        Some(("healthcheck", _)) => run_healthcheck(&catalog),
        _ => Ok(()),
    }
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &ArgMatches) -> Result<()> {
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    if let Some(catalog) = matches.get_one::<String>("catalog") {
        config.store.catalog_path = Some(catalog.into());
    }

    if let Some(("graph", sub)) = matches.subcommand() {
        if let Some(format) = sub.get_one::<String>("format") {
            config.graph.format = format.parse::<OutputFormat>()?;
        }
    }

    Ok(())
}

fn run_graph(catalog: &Catalog<haul::storage::MemStore>, config: &Config, matches: &ArgMatches) -> Result<()> {
    let graph = catalog.graph()?.with_label(config.graph.label.clone());
    let rendered = haul::graph::render(&graph, &config.graph)?;

    match matches.get_one::<String>("output") {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            info!(path = %path, format = %config.graph.format, "Wrote graph");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&rendered)?;
            stdout.flush()?;
        }
    }

    if matches.get_flag("metrics") {
        eprint!("{}", metrics::gather_text());
    }
    Ok(())
}

fn run_healthcheck(catalog: &Catalog<haul::storage::MemStore>) -> Result<()> {
    let status = catalog.healthcheck();
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
