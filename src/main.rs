use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use gpu_usage::commands;

fn build_cli() -> Command {
    let state_file = Arg::new("state-file")
        .long("state-file")
        .value_name("PATH")
        .help("Usage summary file (default: /var/lib/cockpit/gpus/usage-summary.json)");

    Command::new("gpu-usage")
        .about("Collects a bounded hourly history of GPU utilization")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("collect")
                .about("Sample GPU usage periodically and persist the summary")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("SECONDS")
                        .help("Collection interval in seconds (minimum 0.5)")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("once")
                        .long("once")
                        .help("Collect once and exit")
                        .action(ArgAction::SetTrue),
                )
                .arg(state_file.clone())
                .arg(
                    Arg::new("retention-days")
                        .long("retention-days")
                        .value_name("DAYS")
                        .help("Days of history to keep")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("source")
                        .long("source")
                        .value_name("SOURCE")
                        .help("Sample source: nvidia-smi or nvml"),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_name("SECONDS")
                        .help("Timeout for a single hardware query")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Show average GPU usage over the last day, week and month")
                .arg(state_file)
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the report as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show or initialize the configuration file")
                .subcommand(
                    Command::new("init")
                        .about("Write the default configuration file")
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .help("Overwrite an existing file")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(Command::new("path").about("Print the configuration file path")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .help("Shell to generate completions for (bash, zsh, fish, powershell, elvish)")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    gpu_usage::init_logging(matches.get_flag("verbose"));

    if matches.get_flag("version") {
        return commands::version();
    }

    match matches.subcommand() {
        Some(("collect", sub_matches)) => commands::collect(sub_matches),
        Some(("report", sub_matches)) => commands::report(sub_matches),
        Some(("config", sub_matches)) => commands::config::execute(sub_matches),
        Some(("completions", sub_matches)) => {
            let mut cli = build_cli();
            commands::completions::execute(sub_matches, &mut cli)
        }
        Some(("version", _)) => commands::version(),
        _ => {
            println!("Use 'gpu-usage --help' for more information.");
            Ok(())
        }
    }
}
