//! Radiology data element catalog CLI.

use clap::{ColorChoice, Parser};
use rde_cli::logging::{LogConfig, LogFormat, init_logging};
use std::io::{self, IsTerminal};

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg};
use crate::commands::{
    run_add_code, run_add_organization, run_add_person, run_delete, run_get, run_ingest,
    run_link_code, run_link_organization, run_link_person, run_list, run_search, run_update,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let result = match &cli.command {
        Command::Ingest(args) => run_ingest(&cli.db, args),
        Command::Update(args) => run_update(&cli.db, args),
        Command::Get(args) => run_get(&cli.db, args),
        Command::List(args) => run_list(&cli.db, args),
        Command::Search(args) => run_search(&cli.db, args),
        Command::Delete(args) => run_delete(&cli.db, args),
        Command::AddPerson(args) => run_add_person(&cli.db, args),
        Command::AddOrganization(args) => run_add_organization(&cli.db, args),
        Command::AddCode(args) => run_add_code(&cli.db, args),
        Command::LinkPerson(args) => run_link_person(&cli.db, args),
        Command::LinkOrganization(args) => run_link_organization(&cli.db, args),
        Command::LinkCode(args) => run_link_code(&cli.db, args),
    };
    if let Err(error) = result {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !cli.verbosity.is_present();
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
