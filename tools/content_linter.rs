/// Content Linter — validates a content pack and reports authoring issues.
///
/// Usage: content_linter <content.ron> [<override.ron> ...] [--config <path>]

use journey_engine::core::config::EngineConfig;
use journey_engine::core::content::ContentTables;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: content_linter <content.ron> [<override.ron> ...] [--config <path>]");
        process::exit(0);
    }

    let mut content_paths = Vec::new();
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        if args[i] == "--config" && i + 1 < args.len() {
            i += 1;
            config_path = Some(args[i].clone());
        } else {
            content_paths.push(args[i].clone());
        }
        i += 1;
    }

    let config = match config_path {
        Some(ref path) => match EngineConfig::load_from_ron(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: Failed to load config '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let mut content = ContentTables::default();
    for path in &content_paths {
        match ContentTables::load_from_ron(Path::new(path)) {
            Ok(pack) => content.merge(pack),
            Err(e) => {
                eprintln!("ERROR: Failed to load content file '{}': {}", path, e);
                process::exit(1);
            }
        }
    }

    println!(
        "Loaded {} items, {} dialogue nodes, {} encounters, {} step events, {} shop listings",
        content.items.len(),
        content.dialogues.len(),
        content.encounters.len(),
        content.step_events.len(),
        content.shop.len()
    );

    let mut errors = Vec::new();
    if let Err(e) = content.validate() {
        errors.push(e.to_string());
    }
    for encounter in &content.encounters {
        if encounter.position == 0 || encounter.position > config.max_position {
            errors.push(format!(
                "encounter '{}' at position {} can never be reached (track ends at {})",
                encounter.info.id, encounter.position, config.max_position
            ));
        }
    }

    let warnings: Vec<String> = content.lint().iter().map(|issue| issue.to_string()).collect();

    println!("\n=== Content Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        process::exit(1);
    }
}
