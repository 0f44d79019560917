use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use extracto::error::Result;
use extracto::fmt::signed_amount;
use extracto::models::{CandidateTransaction, TxnType};

use super::{build_report, print_report_summary, MappingArgs, SourceArgs};

pub fn run(
    source: &SourceArgs,
    mapping: &MappingArgs,
    dictionary: Option<&std::path::Path>,
    json: bool,
) -> Result<()> {
    let report = build_report(source, mapping, dictionary)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", candidate_table(&report.candidates));
    print_report_summary(&report);
    Ok(())
}

pub(crate) fn candidate_table(candidates: &[CandidateTransaction]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Category", "Type", "Amount"]);
    for txn in candidates {
        let kind = match txn.kind {
            TxnType::Income => txn.kind.as_str().green().to_string(),
            TxnType::Expense => txn.kind.as_str().red().to_string(),
        };
        table.add_row(vec![
            Cell::new(&txn.date),
            Cell::new(&txn.description),
            Cell::new(&txn.category),
            Cell::new(kind),
            Cell::new(signed_amount(txn.kind, txn.amount)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
