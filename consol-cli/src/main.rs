use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use consol_core::{
    Consolidation, CoreError, ExportFormat, FileFailure, Upload, run_batch, write_ledger,
};
use consol_docs::{
    DEFAULT_BUNDLE_NAME, FieldsFile, FillRequest, PictureInsert, Placeholders, TableInsert,
    bundle, fill_docx, generated_name, read_table,
};
use consol_ingest::Layout;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

mod config;
mod logger;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "consol",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CONSOL_BUILD_SHA"), ")"),
    about = "Bank statement consolidation and document generation"
)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the supported statement layouts
    Layouts,

    /// Parse statements and export one date-sorted ledger
    Consolidate {
        /// Statement and its layout as `<path>=<layout>`; repeat per file
        #[arg(long = "file", required = true, value_parser = parse_upload)]
        files: Vec<UploadArg>,

        /// Output file; `.xlsx` or `.csv` (default from config)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the ledger as JSON instead of writing a file
        #[arg(long)]
        json: bool,
    },

    /// Fill office document templates
    Docs {
        #[command(subcommand)]
        command: DocsCommand,
    },

    /// Manage ~/.consol/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DocsCommand {
    /// Fill one template
    Fill {
        #[arg(long)]
        template: PathBuf,

        /// TOML fields file
        #[arg(long)]
        fields: Option<PathBuf>,

        /// Extra literal token, e.g. `--set '<<fee>>=50,000'`
        #[arg(long = "set", value_parser = parse_token)]
        set: Vec<(String, String)>,

        /// PNG or JPEG placed at the image token
        #[arg(long)]
        image: Option<PathBuf>,

        /// Workbook whose sheet is laid out at the table token
        #[arg(long)]
        table: Option<PathBuf>,

        /// Sheet to read from `--table` (default from config)
        #[arg(long)]
        sheet: Option<String>,

        #[arg(long)]
        out: PathBuf,
    },

    /// Fill several templates with the same fields
    Bundle {
        #[arg(long)]
        fields: PathBuf,

        /// Template path or name under the templates dir; repeat per document
        #[arg(long = "template", required = true)]
        templates: Vec<PathBuf>,

        #[arg(long)]
        image: Option<PathBuf>,

        /// A single document is written as is, several are zipped
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate the NAV valuation report from the workings workbook
    Nav {
        #[arg(long)]
        template: PathBuf,

        /// Fields file with a `[nav]` section
        #[arg(long)]
        fields: PathBuf,

        /// NAV workings workbook (.xlsx)
        #[arg(long)]
        workings: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show the first rows of a workbook sheet after cleanup
    Sheet {
        #[arg(long)]
        workings: PathBuf,

        #[arg(long)]
        sheet: Option<String>,

        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Debug, Clone)]
struct UploadArg {
    path: PathBuf,
    layout: Option<Layout>,
}

/// `<path>=<layout>`; a bare path leaves the layout unselected.
fn parse_upload(s: &str) -> std::result::Result<UploadArg, String> {
    match s.rsplit_once('=') {
        Some((path, layout)) => Ok(UploadArg {
            path: PathBuf::from(path),
            layout: Some(layout.parse::<Layout>().map_err(|e| format!("{e}"))?),
        }),
        None => Ok(UploadArg {
            path: PathBuf::from(s),
            layout: None,
        }),
    }
}

fn parse_token(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected TOKEN=VALUE, got {s:?}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    match cli.command {
        Command::Layouts => {
            for layout in Layout::ALL {
                println!("{:<18} {}", layout.id(), layout.label());
            }
        }

        Command::Consolidate { files, out, json } => {
            let cfg = config::load_config()?;
            consolidate(files, out, json, &cfg)?;
        }

        Command::Docs { command } => {
            let cfg = config::load_config()?;
            match command {
                DocsCommand::Fill {
                    template,
                    fields,
                    set,
                    image,
                    table,
                    sheet,
                    out,
                } => {
                    let mut placeholders = match fields {
                        Some(p) => load_fields(&p)?.placeholders(),
                        None => Placeholders::new(),
                    };
                    placeholders.extend(set);
                    let table = match table {
                        Some(p) => Some(sheet_table(&p, sheet.as_deref(), &cfg)?),
                        None => None,
                    };
                    let request = FillRequest {
                        placeholders,
                        picture: picture(image.as_deref(), &cfg)?,
                        table,
                    };
                    let template = cfg.docs.resolve_template(&template);
                    let bytes = fill_template(&template, &request)?;
                    write_file(&out, &bytes)?;
                    println!("Wrote {}", out.display());
                }

                DocsCommand::Bundle {
                    fields,
                    templates,
                    image,
                    out,
                } => {
                    let request = FillRequest {
                        placeholders: load_fields(&fields)?.placeholders(),
                        picture: picture(image.as_deref(), &cfg)?,
                        table: None,
                    };
                    bundle_documents(&templates, &request, out, &cfg)?;
                }

                DocsCommand::Nav {
                    template,
                    fields,
                    workings,
                    out,
                } => {
                    let file = load_fields(&fields)?;
                    let Some(nav) = &file.nav else {
                        bail!("{} has no [nav] section", fields.display());
                    };
                    let request = FillRequest {
                        placeholders: file.placeholders(),
                        picture: None,
                        table: Some(sheet_table(&workings, None, &cfg)?),
                    };
                    let template = cfg.docs.resolve_template(&template);
                    let bytes = fill_template(&template, &request)?;
                    let out = out.unwrap_or_else(|| PathBuf::from(nav.report_file_name()));
                    write_file(&out, &bytes)?;
                    println!("Report generated: {}", out.display());
                }

                DocsCommand::Sheet {
                    workings,
                    sheet,
                    rows,
                } => {
                    let name = sheet.as_deref().unwrap_or(&cfg.docs.nav_sheet);
                    let file = File::open(&workings)
                        .with_context(|| format!("open {}", workings.display()))?;
                    let table = read_table(BufReader::new(file), name).with_context(|| {
                        format!("could not read {name:?} from {}", workings.display())
                    })?;
                    println!("{}", table.header.join(" | "));
                    for row in table.rows.iter().take(rows) {
                        println!("{}", row.join(" | "));
                    }
                }
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read every upload once its layout is known. A file that cannot be read is
/// a failure for that file only.
fn load_uploads(
    files: Vec<UploadArg>,
) -> Result<(Vec<Upload<Cursor<Vec<u8>>>>, Vec<FileFailure>)> {
    let missing: Vec<String> = files
        .iter()
        .filter(|f| f.layout.is_none())
        .map(|f| upload_name(&f.path))
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::MissingLayout { files: missing }.into());
    }

    let mut uploads = Vec::with_capacity(files.len());
    let mut failures = Vec::new();
    for f in files {
        let name = upload_name(&f.path);
        let Some(layout) = f.layout else {
            continue;
        };
        match fs::read(&f.path) {
            Ok(bytes) => uploads.push(Upload::from_bytes(name, bytes, Some(layout))),
            Err(e) => {
                let failure = FileFailure {
                    file: name,
                    layout,
                    message: format!("read {}: {e}", f.path.display()),
                };
                warn!("{}", failure);
                failures.push(failure);
            }
        }
    }
    Ok((uploads, failures))
}

fn consolidate(files: Vec<UploadArg>, out: Option<PathBuf>, json: bool, cfg: &Config) -> Result<()> {
    let (mut uploads, unreadable) = load_uploads(files)?;

    let report = run_batch(&mut uploads)?;
    for failure in unreadable.iter().chain(&report.failures) {
        eprintln!("{failure}");
    }

    let ledger = match report.outcome {
        Consolidation::Ledger(ledger) => ledger,
        Consolidation::NothingFound => {
            println!("No transactions found.");
            return Ok(());
        }
    };

    if json {
        let s = serde_json::to_string_pretty(ledger.rows()).context("serialize ledger")?;
        println!("{s}");
        return Ok(());
    }

    let out = out.unwrap_or_else(|| PathBuf::from(&cfg.export.default_output));
    let format = ExportFormat::from_path(&out)?;
    let file = File::create(&out).with_context(|| format!("create {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    write_ledger(&ledger, format, &mut writer)
        .with_context(|| format!("write {}", out.display()))?;
    writer.flush().with_context(|| format!("write {}", out.display()))?;

    for (file, count) in &report.per_file {
        println!("{file}: {count} transactions");
    }
    println!();
    for s in ledger.summary() {
        println!(
            "{:<30} count={:<4} credits={:>12} debits={:>12}",
            s.bank, s.count, s.credits, s.debits
        );
    }
    println!("\nWrote {} rows to {}", ledger.len(), out.display());
    Ok(())
}

fn load_fields(path: &Path) -> Result<FieldsFile> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

fn picture(image: Option<&Path>, cfg: &Config) -> Result<Option<PictureInsert>> {
    let Some(path) = image else {
        return Ok(None);
    };
    let image = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(Some(PictureInsert {
        token: cfg.docs.image_token.clone(),
        image,
        width_inches: cfg.docs.image_width_inches,
    }))
}

fn sheet_table(workbook: &Path, sheet: Option<&str>, cfg: &Config) -> Result<TableInsert> {
    let name = sheet.unwrap_or(&cfg.docs.nav_sheet);
    let file = File::open(workbook).with_context(|| format!("open {}", workbook.display()))?;
    let table = read_table(BufReader::new(file), name)
        .with_context(|| format!("Error generating NAV table from {}", workbook.display()))?;
    if table.is_empty() {
        warn!("sheet {:?} in {} is empty", name, workbook.display());
    }
    Ok(TableInsert {
        token: cfg.docs.table_token.clone(),
        rows: table.to_rows(),
    })
}

fn fill_template(template: &Path, request: &FillRequest) -> Result<Vec<u8>> {
    let file = File::open(template)
        .with_context(|| format!("Template not found: {}", template.display()))?;
    let filled = fill_docx(BufReader::new(file), request)
        .with_context(|| format!("fill {}", template.display()))?;
    let unused = filled.report.unused(&request.placeholders);
    if !unused.is_empty() {
        info!("{}: {} tokens not present", template.display(), unused.len());
    }
    Ok(filled.bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}

fn bundle_documents(
    templates: &[PathBuf],
    request: &FillRequest,
    out: Option<PathBuf>,
    cfg: &Config,
) -> Result<()> {
    let mut generated = Vec::new();
    for name in templates {
        let path = cfg.docs.resolve_template(name);
        if !path.exists() {
            eprintln!("Template not found: {}", path.display());
            continue;
        }
        let bytes = fill_template(&path, request)?;
        generated.push((generated_name(&path), bytes));
    }

    match generated.as_slice() {
        [] => bail!("No files were generated."),
        [(name, bytes)] => {
            let out = out.unwrap_or_else(|| PathBuf::from(name));
            write_file(&out, bytes)?;
            println!("Document generated successfully: {}", out.display());
        }
        many => {
            let out = out.unwrap_or_else(|| PathBuf::from(DEFAULT_BUNDLE_NAME));
            write_file(&out, &bundle(many)?)?;
            println!("{} documents generated successfully: {}", many.len(), out.display());
        }
    }
    Ok(())
}
