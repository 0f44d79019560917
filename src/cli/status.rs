use extracto::db::{get_connection, ledger_totals};
use extracto::error::Result;
use extracto::fmt::amount;
use extracto::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:     {}", settings.data_dir);
    println!("Database:     {}", db_path.display());
    println!("Scan rows:    {}", settings.header_scan_rows);
    println!(
        "Categories:   {}",
        settings.categories_file.as_deref().unwrap_or("(built-in)")
    );

    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        let (count, income, expense) = ledger_totals(&conn)?;
        let imports: i64 = conn.query_row("SELECT count(*) FROM imports", [], |r| r.get(0))?;

        println!();
        println!("Imports:       {imports}");
        println!("Transactions:  {count}");
        println!("Income:        {}", amount(income));
        println!("Expenses:      {}", amount(expense));
    } else {
        println!();
        println!("Database not found. Run `extracto init` to set up.");
    }

    Ok(())
}
