use extracto::db::{get_connection, init_db, ledger_totals};
use extracto::error::Result;
use extracto::fmt::amount;
use extracto::importer::save_to_ledger;
use extracto::settings::load_settings;

use super::{build_report, print_report_summary, MappingArgs, SourceArgs};

pub fn run(
    source: &SourceArgs,
    mapping: &MappingArgs,
    dictionary: Option<&std::path::Path>,
    db: Option<std::path::PathBuf>,
) -> Result<()> {
    let report = build_report(source, mapping, dictionary)?;
    print_report_summary(&report);

    let db_path = match db {
        Some(path) => path,
        None => {
            let settings = load_settings();
            std::fs::create_dir_all(&settings.data_dir)?;
            settings.db_path()
        }
    };
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    let result = save_to_ledger(&conn, &source.file, &report.candidates)?;
    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }

    println!("{} imported, {} skipped (already in ledger)", result.imported, result.skipped);
    let (count, income, expense) = ledger_totals(&conn)?;
    println!(
        "Ledger: {count} transactions, income {}, expenses {}",
        amount(income),
        amount(expense)
    );
    Ok(())
}
