use comfy_table::{Cell, Table};

use extracto::error::Result;
use extracto::settings::load_settings;

use super::{open_session, SourceArgs};

pub fn run(source: &SourceArgs, json: bool) -> Result<()> {
    let settings = load_settings();
    let session = open_session(source, &settings)?;
    let info = session.header();

    if json {
        println!("{}", serde_json::to_string_pretty(info)?);
        return Ok(());
    }

    println!(
        "Header row {} (document year {})",
        info.header_row_index + 1,
        info.document_year
    );
    let mut table = Table::new();
    table.set_header(vec!["#", "Column"]);
    for (i, name) in info.headers.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(name)]);
    }
    println!("{table}");
    Ok(())
}
