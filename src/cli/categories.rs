use colored::Colorize;
use comfy_table::{Cell, Table};

use extracto::categorizer::CategoryDictionary;
use extracto::error::Result;
use extracto::models::TxnType;
use extracto::settings::load_settings;

fn dictionary(path: Option<&std::path::Path>) -> Result<CategoryDictionary> {
    load_settings().dictionary(path)
}

pub fn list(path: Option<&std::path::Path>, json: bool) -> Result<()> {
    let dict = dictionary(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&dict)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Type", "Priority", "Keywords"]);
    for name in dict.all_categories() {
        let rule = dict.rules.iter().find(|r| r.category == name);
        table.add_row(vec![
            Cell::new(name),
            Cell::new(dict.infer_type(name)),
            Cell::new(rule.map(|r| r.priority.to_string()).unwrap_or_default()),
            Cell::new(rule.map(|r| r.keywords.join(", ")).unwrap_or_default()),
        ]);
    }
    println!("Categories\n{table}");
    println!("Fallback: {}", dict.fallback);
    Ok(())
}

pub fn categorize(path: Option<&std::path::Path>, text: &str, label: bool) -> Result<()> {
    let dict = dictionary(path)?;
    let category = if label {
        dict.normalize_category(text)
    } else {
        dict.categorize(text)
    };
    let kind = match dict.infer_type(&category) {
        TxnType::Income => "income".green(),
        TxnType::Expense => "expense".red(),
    };
    println!("{} ({kind})", category.bold());
    Ok(())
}
