//! Binary entry point. Without a subcommand it opens the grid editor; the
//! subcommands run one conversion or store operation and exit.
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use dataforge::{
    logging, run_app, App, Config, Document, Engine, ExportFormat, FileImport, SnapshotStore,
    SqliteStore,
};

/// dataforge - edit one table, convert between JSON, CSV and SQLite
#[derive(Parser)]
#[command(name = "dataforge")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// File to open in the editor
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Directory holding the snapshot store and log file
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a file into another format, chosen by the output extension
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Table to read when the input SQLite file holds several
        #[arg(short, long)]
        table: Option<String>,

        /// Table name used in the output
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Manage saved snapshots
    Snapshots {
        #[command(subcommand)]
        action: SnapshotAction,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// List saved names
    List,
    /// Delete a saved snapshot
    Delete { name: String },
    /// Export a saved snapshot to a file
    Export {
        name: String,
        output: PathBuf,

        /// Table to read when the snapshot holds several
        #[arg(short, long)]
        table: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir)?;

    match cli.command {
        None => run_editor(&config, cli.file.as_deref()),
        Some(command) => {
            logging::init_stderr(cli.verbose)?;
            match command {
                Command::Convert {
                    input,
                    output,
                    table,
                    name,
                } => convert(&input, &output, table.as_deref(), name.as_deref()),
                Command::Snapshots { action } => snapshots(&config, action),
            }
        }
    }
}

fn run_editor(config: &Config, file: Option<&Path>) -> Result<()> {
    logging::init_file(&config.log_path())?;
    let store: Option<Box<dyn SnapshotStore>> = match SqliteStore::open(&config.store_path()) {
        Ok(store) => Some(Box::new(store)),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "snapshot store unavailable");
            None
        }
    };
    info!(data_dir = %config.data_dir().display(), "starting editor");

    let mut app = App::new(Document::demo(), store, start_engine());
    if let Some(path) = file {
        app.open_path(path);
    }
    run_app(&mut app)
}

fn convert(input: &Path, output: &Path, table: Option<&str>, name: Option<&str>) -> Result<()> {
    let format = output_format(output)?;
    let engine = start_engine();
    let mut doc = Document::demo();

    let outcome = doc
        .import_file(input, engine.as_ref())
        .with_context(|| format!("failed to import {}", input.display()))?;
    settle_choice(&mut doc, outcome, &input.display().to_string(), table)?;
    if let Some(name) = name {
        doc.set_filename(name);
    }

    let bytes = doc
        .export_to(format, engine.as_ref(), output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "{} -> {} ({} rows, {}, {bytes} bytes)",
        input.display(),
        output.display(),
        doc.table().row_count(),
        format.mime()
    );
    Ok(())
}

fn snapshots(config: &Config, action: SnapshotAction) -> Result<()> {
    let store = SqliteStore::open(&config.store_path())?;
    match action {
        SnapshotAction::List => {
            for name in store.list_names()? {
                println!("{name}");
            }
        }
        SnapshotAction::Delete { name } => {
            store.delete(&name)?;
            println!("deleted {name}");
        }
        SnapshotAction::Export {
            name,
            output,
            table,
        } => {
            let format = output_format(&output)?;
            let engine = Engine::new().context("relational engine unavailable")?;
            let mut doc = Document::demo();
            let outcome = doc.open_snapshot(&store, Some(&engine), &name)?;
            settle_choice(&mut doc, outcome, &name, table.as_deref())?;
            let bytes = doc.export_to(format, Some(&engine), &output)?;
            println!("{name} -> {} ({}, {bytes} bytes)", output.display(), format.mime());
        }
    }
    Ok(())
}

/// Finish an import that stopped at a table choice, using `--table`.
fn settle_choice(
    doc: &mut Document,
    outcome: FileImport,
    source: &str,
    table: Option<&str>,
) -> Result<()> {
    if let FileImport::ChooseTable(pending) = outcome {
        let Some(table) = table else {
            bail!(
                "{source} holds several tables ({}); pick one with --table",
                pending.table_names().join(", ")
            );
        };
        doc.choose_table(&pending, table)?;
    }
    Ok(())
}

/// The relational engine, or `None` with the reason logged.
fn start_engine() -> Option<Engine> {
    match Engine::new() {
        Ok(engine) => Some(engine),
        Err(err) => {
            warn!(error = %err, "relational engine unavailable");
            None
        }
    }
}

fn output_format(path: &Path) -> Result<ExportFormat> {
    ExportFormat::from_path(path)
        .ok_or_else(|| anyhow!("cannot tell the output format of {}", path.display()))
}
