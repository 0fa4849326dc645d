use crate::core::Config;
use anyhow::Result;
use colored::Colorize;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("init", sub_matches)) => handle_init(sub_matches),
        Some(("path", _)) => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
        _ => handle_show(),
    }
}

/// Print the effective configuration
fn handle_show() -> Result<()> {
    let config = Config::load()?;
    let config_path = Config::get_config_path()?;

    println!("{}", "Effective configuration:".white());
    println!("{}", serde_json::to_string_pretty(&config)?.cyan());
    println!();

    if config_path.exists() {
        println!("{} {}", "Loaded from:".dimmed(), config_path.display());
    } else {
        println!("{}", "No config file found, using defaults.".yellow());
        println!("{}", "To create one, run:".white());
        println!("  {}", "gpu-usage config init".cyan().bold());
    }

    Ok(())
}

/// Write the default configuration file
fn handle_init(matches: &clap::ArgMatches) -> Result<()> {
    let config_path = Config::get_config_path()?;

    if config_path.exists() && !matches.get_flag("force") {
        println!(
            "{}",
            format!("Config file already exists: {}", config_path.display()).yellow()
        );
        println!("{}", "Use --force to overwrite it.".dimmed());
        return Ok(());
    }

    Config::default().save()?;
    println!(
        "{} {}",
        "✓ Config written to:".green(),
        config_path.display()
    );

    Ok(())
}
