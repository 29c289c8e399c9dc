//! CLI argument definitions for the catalog.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "rde-catalog",
    version,
    about = "Radiology data element catalog",
    long_about = "Catalog structured reporting modules: ingest authoring XML into\n\
                  the relational store, and aggregate element sets with their\n\
                  cross-referenced codes, persons, and organizations."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the catalog database file.
    #[arg(long = "db", value_name = "PATH", default_value = "rde-catalog.db", global = true)]
    pub db: PathBuf,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest a reporting module document as a new element set.
    Ingest(IngestArgs),

    /// Re-ingest a document against an existing set, replacing its elements.
    Update(UpdateArgs),

    /// Show one aggregated element set.
    Get(GetArgs),

    /// List every element set in the catalog.
    List(ListArgs),

    /// Search element sets by keyword (name or RDES identifier).
    Search(SearchArgs),

    /// Delete an element set and its element graph.
    Delete(DeleteArgs),

    /// Add a person to the catalog.
    AddPerson(AddPersonArgs),

    /// Add an organization to the catalog.
    AddOrganization(AddOrganizationArgs),

    /// Add a terminology code to the catalog.
    AddCode(AddCodeArgs),

    /// Link a person to an element set with an optional role.
    LinkPerson(LinkPersonArgs),

    /// Link an organization to an element set with an optional role.
    LinkOrganization(LinkOrganizationArgs),

    /// Link a terminology code to an element set.
    LinkCode(LinkCodeArgs),
}

#[derive(Parser)]
pub struct IngestArgs {
    /// Path to the reporting module XML document.
    #[arg(value_name = "MODULE_XML")]
    pub module: PathBuf,
}

#[derive(Parser)]
pub struct UpdateArgs {
    /// Target set identifier (e.g. RDES12).
    #[arg(value_name = "SET_ID")]
    pub set_id: String,

    /// Path to the replacement reporting module XML document.
    #[arg(value_name = "MODULE_XML")]
    pub module: PathBuf,
}

#[derive(Parser)]
pub struct GetArgs {
    /// Set identifier (e.g. RDES12).
    #[arg(value_name = "SET_ID")]
    pub set_id: String,

    /// Print the aggregated set as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Print the aggregated sets as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct SearchArgs {
    /// Case-insensitive keyword matched against set names and identifiers.
    #[arg(value_name = "KEYWORD")]
    pub keyword: String,

    /// Print the aggregated sets as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct DeleteArgs {
    /// Set identifier (e.g. RDES12).
    #[arg(value_name = "SET_ID")]
    pub set_id: String,
}

#[derive(Parser)]
pub struct AddPersonArgs {
    pub name: String,
    #[arg(long, default_value = "")]
    pub orcid: String,
    #[arg(long, default_value = "")]
    pub url: String,
}

#[derive(Parser)]
pub struct AddOrganizationArgs {
    pub name: String,
    #[arg(long, default_value = "")]
    pub abbreviation: String,
    #[arg(long, default_value = "")]
    pub url: String,
}

#[derive(Parser)]
pub struct AddCodeArgs {
    pub code: String,
    pub system: String,
    #[arg(long, default_value = "")]
    pub display: String,
    #[arg(long, default_value = "")]
    pub url: String,
}

#[derive(Parser)]
pub struct LinkPersonArgs {
    /// Set identifier (e.g. RDES12).
    pub set_id: String,
    /// Internal person id.
    pub person_id: u32,
    /// Role string contributed by this link.
    #[arg(long)]
    pub role: Option<String>,
}

#[derive(Parser)]
pub struct LinkOrganizationArgs {
    /// Set identifier (e.g. RDES12).
    pub set_id: String,
    /// Internal organization id.
    pub organization_id: u32,
    /// Role string contributed by this link.
    #[arg(long)]
    pub role: Option<String>,
}

#[derive(Parser)]
pub struct LinkCodeArgs {
    /// Set identifier (e.g. RDES12).
    pub set_id: String,
    /// Internal index code id.
    pub code_id: u32,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
