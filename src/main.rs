//! Purpose: `mastermem` CLI entry point for inspecting built containers.
//! Role: Binary crate root; parses args, runs commands, emits JSON or plain text on stdout.
//! Invariants: Errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Blobs are mapped read-only and never modified.
use std::error::Error as StdError;
use std::fs::File;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use memmap2::Mmap;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use mastermem::api::{Error, ErrorKind, Store, TableInfo, to_exit_code};
use mastermem::core::format::CONTAINER_FORMAT_VERSION;

#[derive(Parser)]
#[command(
    name = "mastermem",
    version,
    about = "Inspect read-only master data containers",
    long_about = None,
    after_help = r#"EXAMPLES
  $ mastermem info master.bin
  $ mastermem info master.bin --json
  $ mastermem extract master.bin Item item.seg"#
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the tables stored in a container with their segment sizes.
    Info {
        #[arg(value_hint = ValueHint::FilePath)]
        blob: PathBuf,
        /// Emit JSON instead of a text table.
        #[arg(long)]
        json: bool,
    },
    /// Write one table's raw (possibly compressed) segment to a file.
    Extract {
        #[arg(value_hint = ValueHint::FilePath)]
        blob: PathBuf,
        table: String,
        #[arg(value_hint = ValueHint::FilePath)]
        out: PathBuf,
    },
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<(), Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                return Ok(());
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `mastermem --help`."));
            }
        },
    };

    match cli.command {
        Command::Info { blob, json } => info(&blob, json),
        Command::Extract { blob, table, out } => extract(&blob, &table, &out),
    }
}

fn map_blob(path: &Path) -> Result<Mmap, Error> {
    let file = File::open(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to open {}", path.display()))
            .with_source(err)
    })?;
    let mmap = unsafe {
        Mmap::map(&file).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to map {}", path.display()))
                .with_source(err)
        })?
    };
    Ok(mmap)
}

fn info(path: &Path, as_json: bool) -> Result<(), Error> {
    let blob = map_blob(path)?;
    let tables = Store::table_info(&blob, false)?;
    if as_json {
        let value = json!({
            "path": path.display().to_string(),
            "bytes": blob.len(),
            "version": CONTAINER_FORMAT_VERSION,
            "tables": tables,
        });
        emit_json(&value);
        return Ok(());
    }

    println!("{}", info_text(&tables));
    Ok(())
}

fn info_text(tables: &[TableInfo]) -> String {
    let width = tables
        .iter()
        .map(|info| info.name.len())
        .max()
        .unwrap_or(0)
        .max("TABLE".len());
    let mut lines = vec![format!("{:<width$}  {:>12}  CODEC", "TABLE", "BYTES")];
    for info in tables {
        let codec = if info.compressed { "zstd" } else { "raw" };
        lines.push(format!("{:<width$}  {:>12}  {codec}", info.name, info.size));
    }
    lines.join("\n")
}

fn extract(path: &Path, table: &str, out: &Path) -> Result<(), Error> {
    let blob = map_blob(path)?;
    let info = Store::table_info(&blob, true)?
        .into_iter()
        .find(|info| info.name == table)
        .ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("table not present in container")
                .with_table(table)
                .with_hint("Run `mastermem info` to list stored tables.")
        })?;
    let raw = info.raw.as_deref().unwrap_or_default();
    std::fs::write(out, raw).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to write {}", out.display()))
            .with_source(err)
    })?;
    emit_json(&json!({
        "table": info.name,
        "bytes": raw.len(),
        "compressed": info.compressed,
        "out": out.display().to_string(),
    }));
    Ok(())
}

fn emit_json(value: &Value) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error",
        ErrorKind::Usage => "usage error",
        ErrorKind::DuplicateTable => "duplicate table",
        ErrorKind::RecordNotFound => "record not found",
        ErrorKind::ValidationFailed => "validation failed",
        ErrorKind::MalformedContainer => "malformed container",
        ErrorKind::Codec => "codec error",
        ErrorKind::Io => "i/o error",
    }
    .to_string()
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(table) = err.table() {
        inner.insert("table".to_string(), json!(table));
    }
    if let Some(range) = err.range() {
        inner.insert("range".to_string(), json!([range.start, range.end]));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
