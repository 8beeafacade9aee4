//! Binary entry point for the Strata inspection CLI.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use strata::cli::replay::{replay, Script};
use strata::cli::{element_status, history_report, property_report, CliError, ElementStatus};
use strata::storage::{
    AllowAll, AuthorizationSet, Authorizations, EngineConfig, FetchHints,
    HistoricalPropertyValue, InMemoryTable, Property, PropertyFilter, TableElement, TimeRange,
};
use strata::types::{Timestamp, Visibility};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "strata-inspect",
    version,
    about = "Replay a mutation script and inspect the resulting element state",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(long, global = true, value_name = "FILE", help = "Engine configuration (TOML)")]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Target {
    #[arg(value_name = "SCRIPT", help = "JSON mutation script")]
    script: PathBuf,

    #[arg(value_name = "ID", help = "Element id to inspect")]
    id: String,

    #[arg(
        long,
        value_delimiter = ',',
        value_name = "LABEL,LABEL",
        help = "Visibility labels the reader holds"
    )]
    auth: Vec<String>,

    #[arg(long, conflicts_with = "auth", help = "Read with every authorization")]
    all_auths: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print current (or point-in-time) property values.
    Properties {
        #[command(flatten)]
        target: Target,

        #[arg(long, value_name = "TS", help = "Read as of this timestamp")]
        at: Option<Timestamp>,

        #[arg(long, help = "Include hidden properties")]
        include_hidden: bool,
    },
    /// Print property history, newest first.
    History {
        #[command(flatten)]
        target: Target,

        #[arg(long, help = "Restrict to this property key")]
        key: Option<String>,

        #[arg(long, help = "Restrict to this property name")]
        name: Option<String>,

        #[arg(long, help = "Restrict to this property visibility")]
        visibility: Option<String>,

        #[arg(long, value_name = "TS", help = "Earliest timestamp (inclusive)")]
        start: Option<Timestamp>,

        #[arg(long, value_name = "TS", help = "Latest timestamp (inclusive)")]
        end: Option<Timestamp>,
    },
    /// Print deletion and hide status.
    Status {
        #[command(flatten)]
        target: Target,

        #[arg(long, value_name = "TS", help = "Read as of this timestamp")]
        at: Option<Timestamp>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let table = InMemoryTable::new(config.to_options());

    match cli.command {
        Command::Properties {
            target,
            at,
            include_hidden,
        } => {
            let element = load(&table, &target)?;
            let hints = if include_hidden {
                FetchHints::ALL_INCLUDING_HIDDEN
            } else {
                FetchHints::ALL
            };
            let auth = authorizations(&target);
            let report = property_report(&element, hints, at, auth.as_ref())?;
            emit(cli.format, &report, || print_properties_text(&report))?;
        }
        Command::History {
            target,
            key,
            name,
            visibility,
            start,
            end,
        } => {
            let element = load(&table, &target)?;
            let filter = PropertyFilter {
                key,
                name,
                visibility: visibility.map(Visibility::from),
            };
            let auth = authorizations(&target);
            let report =
                history_report(&element, &filter, TimeRange::new(start, end), auth.as_ref())?;
            emit(cli.format, &report, || print_history_text(&report))?;
        }
        Command::Status { target, at } => {
            let element = load(&table, &target)?;
            let auth = authorizations(&target);
            let report = element_status(&element, at, auth.as_ref());
            emit(cli.format, &report, || print_status_text(&report))?;
        }
    }

    Ok(())
}

fn load(table: &InMemoryTable, target: &Target) -> Result<std::sync::Arc<TableElement>, CliError> {
    let script = Script::load(&target.script)?;
    replay(table, &script)?;
    table
        .get(&target.id)
        .ok_or_else(|| CliError::Message(format!("element `{}` not found in script", target.id)))
}

fn authorizations(target: &Target) -> Box<dyn Authorizations> {
    if target.all_auths {
        Box::new(AllowAll)
    } else {
        Box::new(AuthorizationSet::new(target.auth.iter().map(String::as_str)))
    }
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn label(visibility: &Visibility) -> &str {
    if visibility.is_empty() {
        "-"
    } else {
        visibility.as_str()
    }
}

fn hidden_list(hidden: &std::collections::BTreeSet<Visibility>) -> String {
    hidden.iter().map(label).collect::<Vec<_>>().join(",")
}

fn print_properties_text(properties: &[Property]) {
    if properties.is_empty() {
        println!("(no properties)");
        return;
    }
    for p in properties {
        print!(
            "{}:{} [{}] = {} @{}",
            p.key,
            p.name,
            label(&p.visibility),
            p.value,
            p.timestamp
        );
        if p.is_hidden() {
            print!(" hidden={}", hidden_list(&p.hidden_visibilities));
        }
        println!();
        for (key, entry) in p.metadata.iter() {
            println!("  meta {key} = {}", entry.value);
        }
    }
}

fn print_history_text(history: &[HistoricalPropertyValue]) {
    if history.is_empty() {
        println!("(no history)");
        return;
    }
    for h in history {
        let value = h
            .value
            .as_ref()
            .map_or_else(|| "<unset>".to_string(), ToString::to_string);
        let state = if h.is_deleted { "deleted" } else { "set" };
        println!(
            "@{} {}:{} [{}] {state} {value}",
            h.timestamp,
            h.key,
            h.name,
            label(&h.visibility)
        );
    }
}

fn print_status_text(status: &ElementStatus) {
    let ts = |t: Option<Timestamp>| t.map_or_else(|| "-".to_string(), |t| t.to_string());
    println!("id: {}", status.id);
    println!("kind: {:?}", status.kind);
    println!("visibility: {}", label(&status.visibility));
    println!("deleted: {}", status.deleted);
    println!("hidden: {}", status.hidden);
    println!("hidden_visibilities: {}", hidden_list(&status.hidden_visibilities));
    println!("first_timestamp: {}", ts(status.first_timestamp));
    println!("timestamp: {}", ts(status.timestamp));
    println!("mutations: {}", status.mutations);
}
