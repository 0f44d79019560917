pub mod categories;
pub mod headers;
pub mod import;
pub mod init;
pub mod preview;
pub mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use extracto::error::Result;
use extracto::importer::{ImportReport, ImportSession};
use extracto::mapping::ColumnMapping;
use extracto::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(
    name = "extracto",
    version,
    about = "Turn bank-statement spreadsheets into normalized income/expense transactions."
)]
pub struct Cli {
    /// Log pipeline decisions to stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Category dictionary JSON to use instead of the configured one.
    #[arg(long, global = true)]
    pub dictionary: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and create the ledger database.
    Init {
        /// Path for extracto data (default: ~/Documents/extracto)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Show the detected header row, its columns and the document year.
    Headers {
        #[command(flatten)]
        source: SourceArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Normalize a file and print the candidate transactions without saving.
    Preview {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        mapping: MappingArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Normalize a file and store the candidates in the ledger.
    Import {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        mapping: MappingArgs,
        /// Ledger database (default: <data-dir>/extracto.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// List the category taxonomy and its keywords.
    Categories {
        /// Print the dictionary as JSON (loadable with --dictionary)
        #[arg(long)]
        json: bool,
    },
    /// Categorize a single description.
    Categorize {
        /// Description text, e.g. "Pago en Rappi domicilios"
        text: String,
        /// Treat TEXT as a category label to normalize instead
        #[arg(long)]
        label: bool,
    },
    /// Show the configuration and ledger totals.
    Status,
}

#[derive(Args)]
pub struct SourceArgs {
    /// CSV, XLSX, XLS or ODS file
    pub file: PathBuf,
    /// Sheet to read (default: the first one)
    #[arg(long)]
    pub sheet: Option<String>,
    /// How many top rows to search for the header row
    #[arg(long = "scan-rows")]
    pub scan_rows: Option<usize>,
}

#[derive(Args)]
pub struct MappingArgs {
    /// Header of the date column
    #[arg(long)]
    pub date: String,
    /// Header of the description column
    #[arg(long)]
    pub description: String,
    /// Header of the amount column
    #[arg(long)]
    pub amount: String,
    /// Header of a category column
    #[arg(long)]
    pub category: Option<String>,
    /// Header of a transaction type column (e.g. "Abono"/"Compra")
    #[arg(long = "type")]
    pub kind: Option<String>,
    /// Year for dates written without one (default: inferred from the sheet)
    #[arg(long)]
    pub year: Option<i32>,
}

impl MappingArgs {
    pub fn column_mapping(&self) -> ColumnMapping {
        let mut mapping = ColumnMapping::new(&self.date, &self.description, &self.amount);
        if let Some(category) = &self.category {
            mapping = mapping.with_category(category);
        }
        if let Some(kind) = &self.kind {
            mapping = mapping.with_type(kind);
        }
        mapping
    }
}

pub(crate) fn open_session(source: &SourceArgs, settings: &Settings) -> Result<ImportSession> {
    let max_scan = source.scan_rows.unwrap_or(settings.header_scan_rows);
    ImportSession::open(&source.file, source.sheet.as_deref(), max_scan)
}

/// Run the whole pipeline for `preview` and `import`.
pub(crate) fn build_report(
    source: &SourceArgs,
    mapping: &MappingArgs,
    dictionary: Option<&std::path::Path>,
) -> Result<ImportReport> {
    let settings = load_settings();
    let dict = settings.dictionary(dictionary)?;
    let mut session = open_session(source, &settings)?;
    if let Some(year) = mapping.year {
        session = session.with_document_year(year);
    }
    session.normalize(&mapping.column_mapping(), &dict)
}

pub(crate) fn print_report_summary(report: &ImportReport) {
    println!(
        "{} rows read, {} candidates, {} rejected, {} duplicates in file",
        report.rows_read,
        report.candidates.len(),
        report.rejected_total(),
        report.duplicates
    );
    if !report.rejected.is_empty() {
        let reasons: Vec<String> = report
            .rejected
            .iter()
            .map(|(reason, count)| format!("{reason}: {count}"))
            .collect();
        println!("  rejected by field: {}", reasons.join(", "));
    }
}
