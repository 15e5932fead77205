mod app;
mod commands;
mod output;

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // hawkscope info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("hawkscope", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Detect { window } => commands::detect::run(window, &cli.global),
        Command::Probe { path } => commands::probe::run(path, &cli.global),
        Command::Plan {
            window,
            install_dir,
            inspector,
        } => commands::plan::run(window, install_dir, inspector.as_deref(), &cli.global),
        Command::Attach {
            target,
            previous,
            settings,
        } => commands::attach::run(target, previous, settings.as_deref(), &cli.global),
        Command::Bootstrap { args } => commands::bootstrap::run(args, &cli.global),
    }
}
